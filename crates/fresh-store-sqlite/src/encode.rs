//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as whole seconds since the Unix epoch. Subscription
//! levels are stored as their lowercase names.

use chrono::{DateTime, Utc};
use fresh_core::{
  post::{Post, from_epoch},
  subscription::Level,
};

use crate::Result;

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> i64 { dt.timestamp() }

pub fn decode_dt(secs: i64) -> Result<DateTime<Utc>> { Ok(from_epoch(secs)?) }

// ─── Level ───────────────────────────────────────────────────────────────────

pub fn encode_level(level: Level) -> &'static str {
  match level {
    Level::Daily => "daily",
    Level::Weekly => "weekly",
    Level::Both => "both",
  }
}

pub fn decode_level(s: &str) -> Result<Level> { Ok(Level::parse(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawPost`].
pub const POST_COLUMNS: &str = "id, title, perma, url, time, score, submitter";

/// Raw values read directly from a `posts` row.
pub struct RawPost {
  pub id:        String,
  pub title:     String,
  pub perma:     String,
  pub url:       String,
  pub time:      i64,
  pub score:     i64,
  pub submitter: String,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      title:     row.get(1)?,
      perma:     row.get(2)?,
      url:       row.get(3)?,
      time:      row.get(4)?,
      score:     row.get(5)?,
      submitter: row.get(6)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      id:        self.id,
      title:     self.title,
      permalink: self.perma,
      url:       self.url,
      created:   decode_dt(self.time)?,
      score:     self.score,
      submitter: self.submitter,
    })
  }
}
