//! Subscription levels and the state machine that changes them.
//!
//! The transition functions here are pure: the store reads the current level,
//! asks [`Request::apply`] what the next level is, and writes the result back
//! inside a single transaction.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ─── Level ───────────────────────────────────────────────────────────────────

/// Which digests a user receives.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
  Daily,
  Weekly,
  Both,
}

impl Level {
  /// Parse a stored level name.
  pub fn parse(s: &str) -> crate::Result<Self> {
    s.parse().map_err(|_| crate::Error::UnknownLevel(s.to_owned()))
  }

  /// Whether a subscriber at this level should receive the `cadence` digest.
  pub fn receives(self, cadence: Cadence) -> bool {
    matches!(
      (self, cadence),
      (Self::Both, _)
        | (Self::Daily, Cadence::Daily)
        | (Self::Weekly, Cadence::Weekly)
    )
  }
}

/// The two digest editions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Cadence {
  Daily,
  Weekly,
}

impl Cadence {
  /// The single level that subscribes to exactly this cadence.
  pub fn level(self) -> Level {
    match self {
      Self::Daily => Level::Daily,
      Self::Weekly => Level::Weekly,
    }
  }

  /// How far back from now the digest reaches.
  pub fn window(self) -> chrono::Duration {
    match self {
      Self::Daily => chrono::Duration::days(1),
      Self::Weekly => chrono::Duration::days(7),
    }
  }
}

// ─── Requests and transitions ────────────────────────────────────────────────

/// A parsed change a user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
  Subscribe(Level),
  /// `Unsubscribe(Level::Both)` removes the user from every list.
  Unsubscribe(Level),
}

/// What happened to a user's subscription, used to pick the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Subscribed(Level),
  AlreadySubscribed(Level),
  /// Two distinct levels were combined. Written even when the stored level
  /// was already `both`.
  UpgradedToBoth,
  /// Dropped one list out of `both`; `removed` is the list that was dropped.
  Downgraded { removed: Level },
  Removed,
  NotSubscribed,
}

impl Outcome {
  /// Whether the store must write the transition's `after` value.
  pub fn mutates(self) -> bool {
    !matches!(self, Self::AlreadySubscribed(_) | Self::NotSubscribed)
  }
}

/// The result of applying a [`Request`] to a stored level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
  pub before:  Option<Level>,
  /// `None` means the subscription row is deleted (or stays absent).
  pub after:   Option<Level>,
  pub outcome: Outcome,
}

impl Request {
  pub fn apply(self, current: Option<Level>) -> Transition {
    let (after, outcome) = match (self, current) {
      (Self::Subscribe(level), None) => (Some(level), Outcome::Subscribed(level)),
      (Self::Subscribe(level), Some(existing)) if existing == level => {
        (Some(existing), Outcome::AlreadySubscribed(level))
      }
      (Self::Subscribe(_), Some(_)) => (Some(Level::Both), Outcome::UpgradedToBoth),

      (Self::Unsubscribe(_), None) => (None, Outcome::NotSubscribed),
      (Self::Unsubscribe(Level::Daily), Some(Level::Both)) => {
        (Some(Level::Weekly), Outcome::Downgraded { removed: Level::Daily })
      }
      (Self::Unsubscribe(Level::Weekly), Some(Level::Both)) => {
        (Some(Level::Daily), Outcome::Downgraded { removed: Level::Weekly })
      }
      (Self::Unsubscribe(_), Some(_)) => (None, Outcome::Removed),
    };
    Transition { before: current, after, outcome }
  }
}

// ─── Intent parsing ──────────────────────────────────────────────────────────

/// Which kind of request a message subject asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RequestKind {
  Subscribe,
  Unsubscribe,
}

/// How a private message should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
  Change(Request),
  /// The subject named a request but the body had no recognised keyword.
  Unclear(RequestKind),
  /// Neither subscribe nor unsubscribe; goes to the administrator.
  Uncategorized,
}

/// Classify a private message by keywords in its subject and body.
///
/// `unsubscribe` is checked before `subscribe` since the latter is a
/// substring of the former. Matching is case-insensitive and the first
/// keyword found wins.
pub fn parse_intent(subject: &str, body: &str) -> Intent {
  let subject = subject.to_lowercase();
  let body = body.to_lowercase();

  if subject.contains("unsubscribe") {
    let level = [
      ("daily", Level::Daily),
      ("weekly", Level::Weekly),
      ("remove", Level::Both),
    ]
    .into_iter()
    .find_map(|(kw, level)| body.contains(kw).then_some(level));
    match level {
      Some(level) => Intent::Change(Request::Unsubscribe(level)),
      None => Intent::Unclear(RequestKind::Unsubscribe),
    }
  } else if subject.contains("subscribe") {
    let level = [
      ("daily", Level::Daily),
      ("weekly", Level::Weekly),
      ("both", Level::Both),
    ]
    .into_iter()
    .find_map(|(kw, level)| body.contains(kw).then_some(level));
    match level {
      Some(level) => Intent::Change(Request::Subscribe(level)),
      None => Intent::Unclear(RequestKind::Subscribe),
    }
  } else {
    Intent::Uncategorized
  }
}
