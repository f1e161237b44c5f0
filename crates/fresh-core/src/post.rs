//! Archived posts and the raw forum submissions they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, limits::Limits};

/// Short-link prefix used to build a post's permalink from its id.
pub const PERMALINK_PREFIX: &str = "https://redd.it/";

/// Handle recorded when a submission's author account no longer exists.
pub const DELETED_AUTHOR: &str = "[deleted]";

// ─── Submission ──────────────────────────────────────────────────────────────

/// A submission as listed by the forum, before any filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
  pub id:        String,
  pub title:     String,
  /// The external link the submission points at.
  pub url:       String,
  pub created:   DateTime<Utc>,
  pub score:     i64,
  /// `None` when the author deleted their account.
  pub author:    Option<String>,
}

impl Submission {
  /// Whether the submission passes the archival filter at `now`: the title
  /// carries `tag` (case-insensitive), the score is strictly above the
  /// threshold and the submission is younger than the fetch window.
  pub fn qualifies(&self, tag: &str, limits: &Limits, now: DateTime<Utc>) -> bool {
    self.title.to_lowercase().contains(&tag.to_lowercase())
      && self.score > limits.min_score
      && now - self.created < limits.fetch_max_age()
  }

  /// Build the archived record for this submission.
  pub fn to_post(&self) -> Post {
    Post {
      id:        self.id.clone(),
      title:     escape_brackets(&self.title),
      permalink: format!("{PERMALINK_PREFIX}{}", self.id),
      url:       self.url.clone(),
      created:   self.created,
      score:     self.score,
      submitter: self
        .author
        .clone()
        .unwrap_or_else(|| DELETED_AUTHOR.to_owned()),
    }
  }
}

// ─── Post ────────────────────────────────────────────────────────────────────

/// A qualifying submission archived in the store.
///
/// Only `score` ever changes after the record is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
  pub id:        String,
  /// Title with `[` and `]` escaped so it can sit inside link markup.
  pub title:     String,
  pub permalink: String,
  pub url:       String,
  pub created:   DateTime<Utc>,
  pub score:     i64,
  pub submitter: String,
}

impl Post {
  /// Whether a freshly observed score differs enough from the stored one to
  /// be written back.
  pub fn drifted(&self, live_score: i64, limits: &Limits) -> bool {
    (live_score - self.score).abs() > limits.score_drift
  }

  /// The title with bracket escapes removed.
  pub fn plain_title(&self) -> String { unescape_brackets(&self.title) }
}

/// Convert whole seconds since the Unix epoch to a UTC timestamp.
pub fn from_epoch(secs: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp(secs, 0).ok_or(Error::TimestampOutOfRange(secs))
}

// ─── Escaping ────────────────────────────────────────────────────────────────

/// Escape square brackets for markdown link text.
pub fn escape_brackets(s: &str) -> String {
  s.replace('[', "\\[").replace(']', "\\]")
}

/// Inverse of [`escape_brackets`].
pub fn unescape_brackets(s: &str) -> String {
  s.replace("\\[", "[").replace("\\]", "]")
}
