//! Tunable thresholds shared by ingestion, refresh, retention and dispatch.

use chrono::Duration;
use serde::Deserialize;

/// Numeric limits that govern which posts are archived, kept and mailed.
///
/// Every field has a default, so a config file only needs to name the ones it
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
  /// A post qualifies only with a score strictly above this value, and is
  /// swept once its score drops below it.
  pub min_score:          i64,
  /// Submissions older than this are ignored by ingestion.
  pub fetch_max_age_days: i64,
  /// Archived posts older than this are swept.
  pub retention_days:     i64,
  /// Stored scores are rewritten only when the live score moved by more than
  /// this amount.
  pub score_drift:        i64,
  /// How many of the newest submissions ingestion looks at.
  pub fetch_limit:        usize,
  /// Character budget for a single message part. The platform limit is
  /// 10000; the remainder is headroom for the intro and footer.
  pub message_budget:     usize,
}

impl Default for Limits {
  fn default() -> Self {
    Self {
      min_score:          50,
      fetch_max_age_days: 7,
      retention_days:     31,
      score_drift:        20,
      fetch_limit:        5000,
      message_budget:     9000,
    }
  }
}

impl Limits {
  pub fn fetch_max_age(&self) -> Duration { Duration::days(self.fetch_max_age_days) }

  pub fn retention(&self) -> Duration { Duration::days(self.retention_days) }
}
