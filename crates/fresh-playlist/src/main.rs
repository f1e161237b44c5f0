//! `fresh-playlist`: rebuild the weekly streaming playlist from the archive.
//!
//! # Usage
//!
//! ```
//! fresh-playlist --store ~/fresh.db --client-id ID --client-secret SECRET --refresh-token TOKEN
//! fresh-playlist --config ~/.config/fresh/playlist.toml
//! ```

mod client;
mod weekly;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use client::{SpotifyClient, SpotifyConfig};
use fresh_core::store::ArchiveStore;
use fresh_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use weekly::{PlaylistSettings, sync_weekly};

const DEFAULT_NAME: &str = "Weekly Freshness";
const DEFAULT_DESCRIPTION: &str = "The weekly [FRESH]ness, rebuilt every week.";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fresh-playlist", about = "Rebuild the weekly playlist of fresh posts")]
struct Args {
  /// Path to a TOML config file; its values fill any flag not given.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Path of the bot's SQLite archive.
  #[arg(long, env = "FRESH_STORE_PATH")]
  store: Option<PathBuf>,

  #[arg(long, env = "SPOTIFY_CLIENT_ID")]
  client_id: Option<String>,

  #[arg(long, env = "SPOTIFY_CLIENT_SECRET")]
  client_secret: Option<String>,

  /// User refresh token with playlist and image-upload scopes.
  #[arg(long, env = "SPOTIFY_REFRESH_TOKEN")]
  refresh_token: Option<String>,

  /// Playlist to rebuild; created if missing.
  #[arg(long)]
  name: Option<String>,

  /// Description set when the playlist is created.
  #[arg(long)]
  description: Option<String>,

  /// JPEG uploaded as the cover when the playlist is created.
  #[arg(long, value_name = "FILE")]
  cover: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  store:         Option<PathBuf>,
  client_id:     Option<String>,
  client_secret: Option<String>,
  refresh_token: Option<String>,
  name:          Option<String>,
  description:   Option<String>,
  cover:         Option<PathBuf>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let store_path = args
    .store
    .or(file_cfg.store)
    .unwrap_or_else(|| PathBuf::from("fresh.db"));
  let spotify = SpotifyConfig {
    client_id:     required(args.client_id.or(file_cfg.client_id), "client_id")?,
    client_secret: required(args.client_secret.or(file_cfg.client_secret), "client_secret")?,
    refresh_token: required(args.refresh_token.or(file_cfg.refresh_token), "refresh_token")?,
  };
  let cover = match args.cover.or(file_cfg.cover) {
    Some(path) => Some(
      std::fs::read(&path).with_context(|| format!("reading cover image {}", path.display()))?,
    ),
    None => None,
  };
  let settings = PlaylistSettings {
    name: args
      .name
      .or(file_cfg.name)
      .unwrap_or_else(|| DEFAULT_NAME.to_string()),
    description: args
      .description
      .or(file_cfg.description)
      .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
    cover,
  };

  let titles = weekly_titles(&store_path).await?;
  tracing::info!(songs = titles.len(), "fresh songs this week");

  let service = SpotifyClient::connect(&spotify)
    .await
    .context("failed to authenticate with spotify")?;
  let report = sync_weekly(&service, &titles, &settings)
    .await
    .context("failed to rebuild playlist")?;

  println!(
    "{}/{} ({}%) of fresh songs found: {}",
    report.found, report.total, report.percent, report.url
  );
  Ok(())
}

fn required(value: Option<String>, key: &str) -> Result<String> {
  value
    .filter(|v| !v.is_empty())
    .with_context(|| format!("missing {key}: pass it as a flag, env var or config key"))
}

/// Titles of every post archived in the last seven days, highest score first.
async fn weekly_titles(store_path: &Path) -> Result<Vec<String>> {
  let store = SqliteStore::open(store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let posts = store
    .posts_since(Utc::now() - Duration::days(7))
    .await
    .context("failed to read this week's posts")?;
  Ok(posts.into_iter().map(|p| p.title).collect())
}
