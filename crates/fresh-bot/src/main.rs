//! `freshbot` binary: one scheduled operation per invocation.
//!
//! Reads `config.toml` (or the path given with `--config`) overlaid with
//! `FRESH_*` environment variables, opens the SQLite archive, and runs the
//! named operation.
//!
//! ```
//! freshbot getFresh
//! freshbot --config /etc/freshbot.toml mailWeekly
//! FRESH_LOG_DIR=/var/log/freshbot freshbot checkMail
//! ```

use std::{
  path::{Path, PathBuf},
  str::FromStr,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use fresh_bot::{Bot, BotConfig, Job, reddit::RedditClient, stats::render_counts};
use fresh_core::store::ArchiveStore;
use fresh_store_sqlite::SqliteStore;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Fresh post digest bot")]
struct Cli {
  /// Operation to run; `help` lists them.
  operation: Option<String>,

  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Also write logs to a daily-rotated `freshbot.log` in this directory.
  #[arg(long, env = "FRESH_LOG_DIR")]
  log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "camelCase")]
enum Operation {
  GetFresh,
  MailDaily,
  MailWeekly,
  PostWeekly,
  CheckMail,
  Stats,
  Help,
}

impl Operation {
  fn job(self) -> Option<Job> {
    match self {
      Self::GetFresh => Some(Job::GetFresh),
      Self::MailDaily => Some(Job::MailDaily),
      Self::MailWeekly => Some(Job::MailWeekly),
      Self::PostWeekly => Some(Job::PostWeekly),
      Self::CheckMail => Some(Job::CheckMail),
      Self::Stats | Self::Help => None,
    }
  }

  fn describe(self) -> &'static str {
    match self {
      Self::GetFresh => "archive new posts, refresh scores, sweep, read the inbox",
      Self::MailDaily => "read the inbox, refresh scores, mail the daily digest",
      Self::MailWeekly => "read the inbox, refresh scores, mail the weekly digest",
      Self::PostWeekly => "read the inbox, refresh scores, post the weekly digest",
      Self::CheckMail => "read the inbox",
      Self::Stats => "print subscriber counts",
      Self::Help => "list operations",
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  let _guard = init_tracing(cli.log_dir.as_deref())?;

  let Some(raw) = cli.operation.as_deref() else {
    tracing::error!("no operation given; run `freshbot help` for the list");
    return Ok(());
  };
  let Ok(operation) = Operation::from_str(raw) else {
    tracing::error!(operation = %raw, "unrecognised operation; run `freshbot help` for the list");
    return Ok(());
  };

  if operation == Operation::Help {
    for op in Operation::iter() {
      println!("{:<12} {}", op.to_string(), op.describe());
    }
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.as_path()).required(false))
    .add_source(
      config::Environment::with_prefix("FRESH")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let bot_cfg: BotConfig = settings
    .try_deserialize()
    .context("failed to deserialise BotConfig")?;

  let store_path = expand_tilde(&bot_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let Some(job) = operation.job() else {
    let counts = store
      .subscription_counts()
      .await
      .context("failed to count subscriptions")?;
    print!("{}", render_counts(&counts));
    return Ok(());
  };

  let forum = RedditClient::connect(&bot_cfg.reddit, &bot_cfg.subreddit)
    .await
    .context("failed to authenticate with reddit")?;
  let bot = Bot::new(store, forum, bot_cfg);

  if let Err(e) = bot.run(job, Utc::now()).await {
    tracing::error!(%operation, error = %e, "operation failed");
    bot
      .notify_admin(&format!("freshbot {operation} failed"), &format!("Error: {e}"))
      .await;
    return Err(e).with_context(|| format!("{operation} failed"));
  }

  Ok(())
}

/// Log to stdout, and to a daily-rotated file when `log_dir` is set. The
/// returned guard flushes the file writer on drop.
fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  let (file_layer, guard) = match log_dir {
    Some(dir) => {
      std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {dir:?}"))?;
      let appender = tracing_appender::rolling::daily(dir, "freshbot.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
    }
    None => (None, None),
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer())
    .with(file_layer)
    .init();

  Ok(guard)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
