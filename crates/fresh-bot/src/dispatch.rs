//! Sending digests: private messages to subscribers, or a public thread.

use chrono::{DateTime, Utc};
use fresh_core::{forum::ForumClient, store::ArchiveStore, subscription::Cadence};
use fresh_digest::Digest;

use crate::{Bot, Error, Result};

impl<S, F> Bot<S, F>
where
  S: ArchiveStore,
  F: ForumClient,
{
  /// Render the digest covering the `cadence` window ending at `now`.
  pub async fn build_digest(
    &self,
    cadence: Cadence,
    now: DateTime<Utc>,
  ) -> Result<Option<Digest>> {
    let posts = self
      .store
      .posts_since(now - cadence.window())
      .await
      .map_err(Error::store)?;
    Ok(Digest::build(
      cadence,
      &posts,
      self.identity(),
      self.config.limits.message_budget,
    ))
  }

  /// Mail the `cadence` digest to every subscriber who receives it. Returns
  /// the number of messages delivered.
  ///
  /// A failed delivery is logged and the remaining recipients still get
  /// theirs.
  pub async fn mail_digest(&self, cadence: Cadence, now: DateTime<Utc>) -> Result<usize> {
    let Some(digest) = self.build_digest(cadence, now).await? else {
      tracing::info!(%cadence, "no posts in window; nothing to mail");
      return Ok(0);
    };

    let recipients = self.store.subscribers(cadence).await.map_err(Error::store)?;
    let messages = digest.messages();
    let mut sent = 0;
    let mut failed = 0;

    for user in &recipients {
      for message in &messages {
        match self.forum.send_message(user, &message.subject, &message.body).await {
          Ok(()) => sent += 1,
          Err(e) => {
            failed += 1;
            tracing::warn!(%user, subject = %message.subject, error = %e, "failed to send digest");
          }
        }
      }
    }

    tracing::info!(
      %cadence,
      recipients = recipients.len(),
      parts = messages.len(),
      sent,
      failed,
      "digest mailed"
    );
    Ok(sent)
  }

  /// Post the weekly digest as a thread: the first part as a self-post in the
  /// post target, every later part as a reply to the part before it. Returns
  /// the thing names of the chain in order.
  pub async fn post_digest(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
    let Some(digest) = self.build_digest(Cadence::Weekly, now).await? else {
      tracing::info!("no posts in window; nothing to post");
      return Ok(Vec::new());
    };

    let target = self.config.post_target();
    let title = digest.title();
    let mut chain: Vec<String> = Vec::with_capacity(digest.parts.len());

    for body in &digest.parts {
      let name = match chain.last() {
        None => self.forum.submit_post(target, &title, body).await,
        Some(parent) => self.forum.reply_to_post(parent, body).await,
      }
      .map_err(Error::forum)?;
      tracing::debug!(%name, part = chain.len() + 1, "digest part posted");
      chain.push(name);
    }

    tracing::info!(community = %target, %title, parts = chain.len(), "digest posted");
    Ok(chain)
  }
}
