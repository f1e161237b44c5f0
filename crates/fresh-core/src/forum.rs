//! The `ForumClient` trait: everything the bot needs from the forum's API.
//!
//! The Reddit adapter in `fresh-bot` implements it over HTTP; tests implement
//! it in memory.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::post::Submission;

/// An unread item from the bot account's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxMessage {
  /// Full thing name (e.g. `t4_abc`); used to reply and to mark read.
  pub name:        String,
  pub subject:     String,
  pub body:        String,
  /// `None` for messages from deleted accounts or the platform itself.
  pub author:      Option<String>,
  /// Set for comment-reply and mention notifications.
  pub was_comment: bool,
  /// Link to the comment for notifications; empty for private messages.
  pub context:     String,
}

/// Abstraction over the forum's API.
///
/// Every call is a blocking round-trip from the bot's point of view; callers
/// await them one at a time.
pub trait ForumClient: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The newest submissions of the scanned community, newest first, at most
  /// `limit` of them.
  fn new_submissions(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  /// The current score of one submission.
  fn submission_score<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// All unread inbox items.
  fn unread_messages(
    &self,
  ) -> impl Future<Output = Result<Vec<InboxMessage>, Self::Error>> + Send + '_;

  fn mark_read<'a>(
    &'a self,
    message: &'a InboxMessage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Reply to an inbox item in its own thread.
  fn reply<'a>(
    &'a self,
    message: &'a InboxMessage,
    body: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Start a new private conversation with `to`.
  fn send_message<'a>(
    &'a self,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Submit a self-post and return its full thing name.
  fn submit_post<'a>(
    &'a self,
    community: &'a str,
    title: &'a str,
    body: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Reply to a post or comment and return the new comment's thing name.
  fn reply_to_post<'a>(
    &'a self,
    parent: &'a str,
    body: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
