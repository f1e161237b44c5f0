//! [`SqliteStore`]: the SQLite implementation of [`ArchiveStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use fresh_core::{
  post::Post,
  store::{ArchiveStore, ScoreUpdate, SubscriptionCounts},
  subscription::{Cadence, Level, Request, Transition},
};

use crate::{
  Error, Result,
  encode::{POST_COLUMNS, RawPost, decode_level, encode_dt, encode_level},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The bot's archive backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a post query whose rows follow [`POST_COLUMNS`].
  async fn query_posts(&self, sql: String, cutoff: Option<i64>) -> Result<Vec<Post>> {
    let raws: Vec<RawPost> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = match cutoff {
          Some(c) => stmt
            .query_map(rusqlite::params![c], RawPost::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map([], RawPost::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }
}

fn to_count(n: i64) -> Result<usize> { usize::try_from(n).map_err(|_| Error::Count(n)) }

// ─── ArchiveStore impl ───────────────────────────────────────────────────────

impl ArchiveStore for SqliteStore {
  type Error = Error;

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn archive_posts(&self, posts: Vec<Post>) -> Result<Vec<String>> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = Vec::new();
        {
          // Insert-if-absent keeps the existence check and the write inside
          // the same statement.
          let mut stmt = tx.prepare(
            "INSERT INTO posts (id, title, perma, url, time, score, submitter)
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
             WHERE NOT EXISTS (SELECT 1 FROM posts WHERE id = ?1)",
          )?;
          for post in posts {
            let changed = stmt.execute(rusqlite::params![
              post.id,
              post.title,
              post.permalink,
              post.url,
              encode_dt(post.created),
              post.score,
              post.submitter,
            ])?;
            if changed > 0 {
              inserted.push(post.id);
            }
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    Ok(inserted)
  }

  async fn list_posts(&self) -> Result<Vec<Post>> {
    self
      .query_posts(format!("SELECT {POST_COLUMNS} FROM posts"), None)
      .await
  }

  async fn posts_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Post>> {
    self
      .query_posts(
        format!(
          "SELECT {POST_COLUMNS} FROM posts
           WHERE time > ?1
           ORDER BY score DESC, time ASC"
        ),
        Some(encode_dt(cutoff)),
      )
      .await
  }

  async fn update_scores(&self, updates: Vec<ScoreUpdate>) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut changed = 0;
        {
          let mut stmt = tx.prepare("UPDATE posts SET score = ?1 WHERE id = ?2")?;
          for update in updates {
            changed += stmt.execute(rusqlite::params![update.score, update.id])?;
          }
        }
        tx.commit()?;
        Ok(changed)
      })
      .await?;

    Ok(changed)
  }

  async fn sweep_posts(
    &self,
    created_before: DateTime<Utc>,
    min_score: i64,
  ) -> Result<usize> {
    let before = encode_dt(created_before);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM posts WHERE time < ?1 OR score < ?2",
          rusqlite::params![before, min_score],
        )?)
      })
      .await?;

    Ok(deleted)
  }

  // ── Subscriptions ─────────────────────────────────────────────────────────

  async fn apply_subscription(&self, user: &str, request: Request) -> Result<Transition> {
    let user = user.to_owned();

    let transition = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<String> = tx
          .query_row(
            "SELECT subscription FROM subscriptions WHERE user = ?1 LIMIT 1",
            rusqlite::params![user],
            |row| row.get(0),
          )
          .optional()?;
        let current = current
          .as_deref()
          .map(Level::parse)
          .transpose()
          .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;

        let transition = request.apply(current);

        if transition.outcome.mutates() {
          // Delete-then-insert also collapses duplicate rows left behind by
          // databases created without the primary key.
          tx.execute(
            "DELETE FROM subscriptions WHERE user = ?1",
            rusqlite::params![user],
          )?;
          if let Some(level) = transition.after {
            tx.execute(
              "INSERT INTO subscriptions (user, subscription) VALUES (?1, ?2)",
              rusqlite::params![user, encode_level(level)],
            )?;
          }
        }

        tx.commit()?;
        Ok(transition)
      })
      .await?;

    Ok(transition)
  }

  async fn subscribers(&self, cadence: Cadence) -> Result<Vec<String>> {
    let level = encode_level(cadence.level());
    let both = encode_level(Level::Both);

    let users = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT user FROM subscriptions
           WHERE subscription = ?1 OR subscription = ?2
           ORDER BY user",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![level, both], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(users)
  }

  async fn subscription_counts(&self) -> Result<SubscriptionCounts> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT subscription, COUNT(*) FROM subscriptions GROUP BY subscription",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut counts = SubscriptionCounts::default();
    for (level, n) in rows {
      let n = to_count(n)?;
      match decode_level(&level)? {
        Level::Daily => counts.daily += n,
        Level::Weekly => counts.weekly += n,
        Level::Both => counts.both += n,
      }
    }
    Ok(counts)
  }
}
