//! Keeping the post archive current: ingestion, score refresh and retention.

use chrono::{DateTime, Utc};
use fresh_core::{
  forum::ForumClient,
  post::{Post, Submission},
  store::{ArchiveStore, ScoreUpdate},
};

use crate::{Bot, Error, Result};

/// Counts from one score refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
  pub checked: usize,
  pub updated: usize,
  /// Posts whose live score could not be fetched; left untouched.
  pub failed:  usize,
}

impl<S, F> Bot<S, F>
where
  S: ArchiveStore,
  F: ForumClient,
{
  /// Archive every qualifying submission not yet in the store. Returns the
  /// newly archived ids.
  pub async fn ingest(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
    let limits = &self.config.limits;
    let submissions = self
      .forum
      .new_submissions(limits.fetch_limit)
      .await
      .map_err(Error::forum)?;

    let qualifying: Vec<Post> = submissions
      .iter()
      .filter(|s| s.qualifies(&self.config.tag, limits, now))
      .map(Submission::to_post)
      .collect();
    let candidates = qualifying.len();

    let inserted = self
      .store
      .archive_posts(qualifying.clone())
      .await
      .map_err(Error::store)?;

    for post in qualifying.iter().filter(|p| inserted.contains(&p.id)) {
      let age_hours = (now - post.created).num_minutes() as f64 / 60.0;
      tracing::debug!(
        id = %post.id,
        title = %post.title,
        score = post.score,
        age_hours,
        "archived fresh post"
      );
    }

    tracing::info!(
      scanned = submissions.len(),
      qualifying = candidates,
      archived = inserted.len(),
      "ingestion complete"
    );
    Ok(inserted)
  }

  /// Re-read every archived post's live score and store the ones that moved
  /// by more than the drift threshold.
  ///
  /// A post whose score cannot be fetched is logged and skipped.
  pub async fn refresh_scores(&self) -> Result<RefreshReport> {
    let posts = self.store.list_posts().await.map_err(Error::store)?;
    let mut report = RefreshReport { checked: posts.len(), ..Default::default() };
    let mut updates = Vec::new();

    for post in &posts {
      let live = match self.forum.submission_score(&post.id).await {
        Ok(score) => score,
        Err(e) => {
          tracing::warn!(id = %post.id, error = %e, "failed to fetch live score");
          report.failed += 1;
          continue;
        }
      };

      if post.drifted(live, &self.config.limits) {
        tracing::debug!(
          id = %post.id,
          old = post.score,
          new = live,
          change = live - post.score,
          "score updated"
        );
        updates.push(ScoreUpdate { id: post.id.clone(), score: live });
      }
    }

    report.updated = self.store.update_scores(updates).await.map_err(Error::store)?;
    tracing::info!(
      checked = report.checked,
      updated = report.updated,
      failed = report.failed,
      "score refresh complete"
    );
    Ok(report)
  }

  /// Delete posts older than the retention window or below the score
  /// threshold. Returns the number deleted.
  pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
    let limits = &self.config.limits;
    let deleted = self
      .store
      .sweep_posts(now - limits.retention(), limits.min_score)
      .await
      .map_err(Error::store)?;
    tracing::info!(deleted, "retention sweep complete");
    Ok(deleted)
  }
}
