//! The Fresh digest bot.
//!
//! Archives tagged forum posts, keeps their scores current, answers
//! subscription requests from the inbox, and sends or posts daily and weekly
//! digests. Each scheduled run performs one [`Job`] against a [`Bot`] built
//! from any [`ArchiveStore`] and [`ForumClient`].

pub mod archive;
pub mod dispatch;
pub mod error;
pub mod inbox;
pub mod reddit;
pub mod stats;

pub use error::{Error, Result};

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fresh_core::{forum::ForumClient, limits::Limits, store::ArchiveStore, subscription::Cadence};
use fresh_digest::Identity;
use serde::Deserialize;

use reddit::RedditConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `FRESH_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct BotConfig {
  pub store_path:     PathBuf,
  /// Community scanned for tagged posts, without the `/r/` prefix.
  pub subreddit:      String,
  /// Where weekly digests are posted; defaults to `subreddit`. Point it at a
  /// private test community for dry runs.
  #[serde(default)]
  pub post_subreddit: Option<String>,
  /// Handle that receives forwarded messages and failure notices.
  pub admin:          String,
  /// Case-insensitive marker a title must contain to be archived.
  #[serde(default = "default_tag")]
  pub tag:            String,
  #[serde(default)]
  pub source_url:     Option<String>,
  pub reddit:         RedditConfig,
  #[serde(default)]
  pub limits:         Limits,
}

fn default_tag() -> String { "[fresh".to_owned() }

impl BotConfig {
  pub fn identity(&self) -> Identity {
    Identity {
      bot:        self.reddit.username.clone(),
      admin:      self.admin.clone(),
      community:  self.subreddit.clone(),
      source_url: self.source_url.clone(),
    }
  }

  /// The community weekly digests are posted to.
  pub fn post_target(&self) -> &str {
    self.post_subreddit.as_deref().unwrap_or(&self.subreddit)
  }
}

// ─── Jobs ─────────────────────────────────────────────────────────────────────

/// One scheduled unit of work. Each runs to completion before the process
/// exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
  /// Archive new posts, refresh scores, sweep expired posts, read the inbox.
  GetFresh,
  /// Read the inbox, refresh scores, mail the daily digest.
  MailDaily,
  /// Read the inbox, refresh scores, mail the weekly digest.
  MailWeekly,
  /// Read the inbox, refresh scores, post the weekly digest as a thread.
  PostWeekly,
  /// Read the inbox only.
  CheckMail,
}

// ─── Bot ──────────────────────────────────────────────────────────────────────

/// The store, the forum session and the configuration for one run.
pub struct Bot<S, F> {
  pub store:  S,
  pub forum:  F,
  pub config: BotConfig,
  identity:   Identity,
}

impl<S, F> Bot<S, F>
where
  S: ArchiveStore,
  F: ForumClient,
{
  pub fn new(store: S, forum: F, config: BotConfig) -> Self {
    let identity = config.identity();
    Self { store, forum, config, identity }
  }

  pub fn identity(&self) -> &Identity { &self.identity }

  /// Run `job` as of `now`.
  pub async fn run(&self, job: Job, now: DateTime<Utc>) -> Result<()> {
    tracing::info!(?job, "starting job");
    match job {
      Job::GetFresh => {
        self.ingest(now).await?;
        self.refresh_scores().await?;
        self.sweep(now).await?;
        self.process_inbox().await?;
      }
      Job::MailDaily => {
        self.process_inbox().await?;
        self.refresh_scores().await?;
        self.mail_digest(Cadence::Daily, now).await?;
      }
      Job::MailWeekly => {
        self.process_inbox().await?;
        self.refresh_scores().await?;
        self.mail_digest(Cadence::Weekly, now).await?;
      }
      Job::PostWeekly => {
        self.process_inbox().await?;
        self.refresh_scores().await?;
        self.post_digest(now).await?;
      }
      Job::CheckMail => {
        self.process_inbox().await?;
      }
    }
    tracing::info!(?job, "job finished");
    Ok(())
  }

  /// Tell the administrator about a failure by private message.
  ///
  /// Best effort: a failed send is logged and otherwise ignored.
  pub async fn notify_admin(&self, subject: &str, body: &str) {
    if let Err(e) = self.forum.send_message(&self.config.admin, subject, body).await {
      tracing::error!(error = %e, admin = %self.config.admin, "failed to notify admin");
    }
  }
}
