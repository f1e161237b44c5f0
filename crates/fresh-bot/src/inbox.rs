//! Answering the bot's inbox: subscription requests, forwarding, mark-read.

use fresh_core::{
  forum::{ForumClient, InboxMessage},
  store::ArchiveStore,
  subscription::{Intent, parse_intent},
};
use fresh_digest::templates::{
  UNCLEAR_REPLY, forwarded_comment, forwarded_message, outcome_reply,
};

use crate::{Bot, Error, Result};

/// Shown in place of an author handle for messages without one.
const UNKNOWN_AUTHOR: &str = "[unknown]";

/// What was done with one inbox item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
  /// A reply was composed for the sender (delivery may still have failed).
  Replied(String),
  /// Passed to the administrator without a reply to the sender.
  Forwarded,
}

impl<S, F> Bot<S, F>
where
  S: ArchiveStore,
  F: ForumClient,
{
  /// Handle every unread inbox item and mark each one read. Returns the
  /// number of items processed.
  ///
  /// Failures to reply, forward or mark read are logged and processing moves
  /// on. A store failure aborts the pass, leaving the current item unread so
  /// the next run picks it up again.
  pub async fn process_inbox(&self) -> Result<usize> {
    let messages = self.forum.unread_messages().await.map_err(Error::forum)?;
    let mut processed = 0;

    for message in &messages {
      self.handle_message(message).await?;

      if let Err(e) = self.forum.mark_read(message).await {
        tracing::warn!(message = %message.name, error = %e, "failed to mark message read");
      }
      processed += 1;
    }

    tracing::info!(processed, "inbox processed");
    Ok(processed)
  }

  /// Decide on and send the response to a single inbox item.
  pub async fn handle_message(&self, message: &InboxMessage) -> Result<Handled> {
    let author = message.author.as_deref().unwrap_or(UNKNOWN_AUTHOR);

    if message.was_comment {
      tracing::info!(%author, "forwarding comment notification to admin");
      self
        .forward(
          &format!("Comment from /u/{author}"),
          &forwarded_comment(author, &message.subject, &message.context, &message.body),
        )
        .await;
      return Ok(Handled::Forwarded);
    }

    let intent = parse_intent(&message.subject, &message.body);
    let reply = match (message.author.as_deref(), intent) {
      (Some(user), Intent::Change(request)) => {
        let transition = self
          .store
          .apply_subscription(user, request)
          .await
          .map_err(Error::store)?;
        tracing::info!(
          %user,
          ?request,
          before = ?transition.before,
          after = ?transition.after,
          "subscription request handled"
        );
        outcome_reply(transition.outcome)
      }
      (Some(user), Intent::Unclear(kind)) => {
        tracing::info!(%user, %kind, "request could not be understood");
        UNCLEAR_REPLY.to_owned()
      }
      // Messages without an author cannot hold a subscription; the admin
      // sees them instead.
      (None, _) | (_, Intent::Uncategorized) => {
        tracing::info!(%author, "forwarding message to admin");
        self
          .forward(
            &format!("PM from /u/{author}"),
            &forwarded_message(author, &message.subject, &message.body),
          )
          .await;
        if message.author.is_none() {
          return Ok(Handled::Forwarded);
        }
        self.identity().forwarded_reply()
      }
    };

    let body = format!("{reply}{}", self.identity().footer());
    if let Err(e) = self.forum.reply(message, &body).await {
      tracing::error!(%author, reply = %reply, error = %e, "failed to send reply");
    }
    Ok(Handled::Replied(reply))
  }

  async fn forward(&self, subject: &str, body: &str) {
    if let Err(e) = self.forum.send_message(&self.config.admin, subject, body).await {
      tracing::error!(admin = %self.config.admin, subject, error = %e, "failed to forward message");
    }
  }
}
