//! The `ArchiveStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `fresh-store-sqlite`).
//! The bot and the playlist builder depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  post::Post,
  subscription::{Cadence, Request, Transition},
};

/// A score observed on the forum that should replace the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
  pub id:    String,
  pub score: i64,
}

/// Subscriber totals per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionCounts {
  pub daily:  usize,
  pub weekly: usize,
  pub both:   usize,
}

impl SubscriptionCounts {
  pub fn users(&self) -> usize { self.daily + self.weekly + self.both }
}

/// Abstraction over the bot's persistent state: archived posts and user
/// subscriptions.
///
/// Writes that depend on a prior read are atomic in every implementation, so
/// overlapping runs cannot duplicate posts or lose subscription changes.
pub trait ArchiveStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Insert every post whose id is not yet archived, in one transaction.
  /// Returns the ids that were actually inserted, in input order.
  fn archive_posts(
    &self,
    posts: Vec<Post>,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Every archived post, in no particular order.
  fn list_posts(
    &self,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  /// Posts created strictly after `cutoff`, highest score first.
  fn posts_since(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  /// Write new scores in one transaction. Returns the number of rows changed.
  fn update_scores(
    &self,
    updates: Vec<ScoreUpdate>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Delete posts created before `created_before` **or** scoring below
  /// `min_score`. Returns the number of rows deleted.
  fn sweep_posts(
    &self,
    created_before: DateTime<Utc>,
    min_score: i64,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Subscriptions ─────────────────────────────────────────────────────

  /// Read the user's level, apply `request` and persist the result, all in
  /// one transaction.
  fn apply_subscription<'a>(
    &'a self,
    user: &'a str,
    request: Request,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + 'a;

  /// Users whose level receives the `cadence` digest.
  fn subscribers(
    &self,
    cadence: Cadence,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  fn subscription_counts(
    &self,
  ) -> impl Future<Output = Result<SubscriptionCounts, Self::Error>> + Send + '_;
}
