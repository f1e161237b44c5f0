//! SQL schema for the Fresh SQLite store.
//!
//! Column names match the legacy `fresh.db` layout, so an existing
//! database file opens unchanged. Files created by this schema additionally
//! carry primary keys on `posts.id` and `subscriptions.user`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per archived submission. Only `score` is ever updated.
CREATE TABLE IF NOT EXISTS posts (
    id        TEXT PRIMARY KEY,
    title     TEXT NOT NULL,   -- brackets escaped for link markup
    perma     TEXT NOT NULL,
    url       TEXT NOT NULL,
    time      INTEGER NOT NULL, -- creation time, seconds since epoch (UTC)
    score     INTEGER NOT NULL,
    submitter TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subscriptions (
    user         TEXT PRIMARY KEY,
    subscription TEXT NOT NULL  -- 'daily' | 'weekly' | 'both'
);

CREATE INDEX IF NOT EXISTS posts_time_idx ON posts(time);

PRAGMA user_version = 1;
";
