//! Rebuilding the weekly playlist from the week's archived posts.

use std::future::Future;

use anyhow::Result;
use fresh_core::post::unescape_brackets;

/// Most tracks the streaming API accepts in one add or remove call.
pub const TRACK_BATCH: usize = 100;

/// A playlist on the streaming service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
  pub id:  String,
  /// Public link to the playlist.
  pub url: String,
}

/// What the streaming service must provide to rebuild a playlist.
pub trait PlaylistService {
  /// A playlist owned by the authenticated user with exactly this name.
  fn find_playlist<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Playlist>>> + Send + 'a;

  fn create_playlist<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Playlist>> + Send + 'a;

  fn update_description<'a>(
    &'a self,
    playlist_id: &'a str,
    description: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Replace the cover with a JPEG image.
  fn upload_cover<'a>(
    &'a self,
    playlist_id: &'a str,
    jpeg: &'a [u8],
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// URI of the best match for a free-text query, if any.
  fn search_track<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Option<String>>> + Send + 'a;

  /// URIs of every track currently in the playlist.
  fn playlist_tracks<'a>(
    &'a self,
    playlist_id: &'a str,
  ) -> impl Future<Output = Result<Vec<String>>> + Send + 'a;

  /// Remove every occurrence of `uris`. At most [`TRACK_BATCH`] per call.
  fn remove_tracks<'a>(
    &'a self,
    playlist_id: &'a str,
    uris: &'a [String],
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Append `uris`. At most [`TRACK_BATCH`] per call.
  fn add_tracks<'a>(
    &'a self,
    playlist_id: &'a str,
    uris: &'a [String],
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}

/// Name, description and cover used when the playlist has to be created.
#[derive(Debug, Clone)]
pub struct PlaylistSettings {
  pub name:        String,
  pub description: String,
  pub cover:       Option<Vec<u8>>,
}

/// Outcome of one rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
  pub url:     String,
  pub found:   usize,
  pub total:   usize,
  /// Share of titles found, rounded to one decimal place.
  pub percent: f64,
}

/// Search text for an archived title: brackets unescaped and the leading
/// `[TAG]` marker dropped. Titles without a marker are searched as-is.
pub fn search_query(title: &str) -> String {
  let plain = unescape_brackets(title);
  let trimmed = plain.trim();
  match trimmed.strip_prefix('[').and_then(|rest| rest.split_once("] ")) {
    Some((_, song)) => song.trim().to_owned(),
    None => trimmed.to_owned(),
  }
}

fn percent(found: usize, total: usize) -> f64 {
  if total == 0 {
    return 0.0;
  }
  (1000.0 * found as f64 / total as f64).round() / 10.0
}

/// Replace the playlist's contents with the best match for each title.
///
/// The playlist is created (with description and cover) if it does not exist.
/// A failed search is logged and the title counted as not found.
pub async fn sync_weekly<P: PlaylistService>(
  service: &P,
  titles: &[String],
  settings: &PlaylistSettings,
) -> Result<SyncReport> {
  let playlist = match service.find_playlist(&settings.name).await? {
    Some(playlist) => {
      tracing::debug!(name = %settings.name, id = %playlist.id, "found playlist");
      playlist
    }
    None => {
      tracing::info!(name = %settings.name, "creating playlist");
      let playlist = service.create_playlist(&settings.name).await?;
      service.update_description(&playlist.id, &settings.description).await?;
      if let Some(cover) = &settings.cover {
        service.upload_cover(&playlist.id, cover).await?;
      }
      playlist
    }
  };

  let mut found = Vec::new();
  for title in titles {
    let query = search_query(title);
    if query.is_empty() {
      continue;
    }
    match service.search_track(&query).await {
      Ok(Some(uri)) => found.push(uri),
      Ok(None) => tracing::debug!(%query, "no track found"),
      Err(e) => tracing::error!(%query, error = %e, "track search failed"),
    }
  }

  let current = service.playlist_tracks(&playlist.id).await?;
  for batch in current.chunks(TRACK_BATCH) {
    service.remove_tracks(&playlist.id, batch).await?;
  }
  for batch in found.chunks(TRACK_BATCH) {
    service.add_tracks(&playlist.id, batch).await?;
  }

  let report = SyncReport {
    url:     playlist.url,
    found:   found.len(),
    total:   titles.len(),
    percent: percent(found.len(), titles.len()),
  };
  tracing::info!(
    found = report.found,
    total = report.total,
    percent = report.percent,
    removed = current.len(),
    "fresh songs found on the streaming service"
  );
  Ok(report)
}

#[cfg(test)]
mod tests {
  use std::{collections::HashMap, sync::Mutex};

  use anyhow::anyhow;

  use super::*;

  #[derive(Default)]
  struct State {
    playlists:   Vec<Playlist>,
    tracks:      HashMap<String, Vec<String>>,
    catalogue:   HashMap<String, String>,
    failing:     Vec<String>,
    description: Option<String>,
    cover:       Option<Vec<u8>>,
    add_calls:   Vec<usize>,
  }

  #[derive(Default)]
  struct FakeService {
    state: Mutex<State>,
  }

  impl FakeService {
    fn state(&self) -> std::sync::MutexGuard<'_, State> { self.state.lock().unwrap() }
  }

  impl PlaylistService for FakeService {
    async fn find_playlist(&self, name: &str) -> Result<Option<Playlist>> {
      Ok(self.state().playlists.iter().find(|p| p.id == name).cloned())
    }

    async fn create_playlist(&self, name: &str) -> Result<Playlist> {
      let playlist =
        Playlist { id: name.into(), url: format!("https://open.example.com/{name}") };
      self.state().playlists.push(playlist.clone());
      Ok(playlist)
    }

    async fn update_description(&self, _: &str, description: &str) -> Result<()> {
      self.state().description = Some(description.into());
      Ok(())
    }

    async fn upload_cover(&self, _: &str, jpeg: &[u8]) -> Result<()> {
      self.state().cover = Some(jpeg.to_vec());
      Ok(())
    }

    async fn search_track(&self, query: &str) -> Result<Option<String>> {
      let state = self.state();
      if state.failing.iter().any(|f| f == query) {
        return Err(anyhow!("search unavailable"));
      }
      Ok(state.catalogue.get(query).cloned())
    }

    async fn playlist_tracks(&self, id: &str) -> Result<Vec<String>> {
      Ok(self.state().tracks.get(id).cloned().unwrap_or_default())
    }

    async fn remove_tracks(&self, id: &str, uris: &[String]) -> Result<()> {
      let mut state = self.state();
      if let Some(tracks) = state.tracks.get_mut(id) {
        tracks.retain(|t| !uris.contains(t));
      }
      Ok(())
    }

    async fn add_tracks(&self, id: &str, uris: &[String]) -> Result<()> {
      let mut state = self.state();
      state.add_calls.push(uris.len());
      state.tracks.entry(id.into()).or_default().extend_from_slice(uris);
      Ok(())
    }
  }

  fn settings() -> PlaylistSettings {
    PlaylistSettings {
      name:        "Weekly Freshness".into(),
      description: "The weekly [FRESH]ness".into(),
      cover:       Some(vec![0xff, 0xd8, 0xff]),
    }
  }

  #[test]
  fn query_drops_the_tag() {
    assert_eq!(search_query("\\[FRESH\\] Artist - Song"), "Artist - Song");
    assert_eq!(search_query("[FRESH VIDEO] Artist - Song [prod. X]"), "Artist - Song [prod. X]");
    assert_eq!(search_query("Artist - Song"), "Artist - Song");
  }

  #[test]
  fn percent_rounds_to_one_place() {
    assert_eq!(percent(2, 3), 66.7);
    assert_eq!(percent(0, 0), 0.0);
  }

  #[tokio::test]
  async fn creates_missing_playlist_with_metadata() {
    let service = FakeService::default();
    service
      .state()
      .catalogue
      .insert("Artist - Song".into(), "spotify:track:1".into());

    let report = sync_weekly(&service, &["\\[FRESH\\] Artist - Song".to_owned()], &settings())
      .await
      .unwrap();

    assert_eq!(report.url, "https://open.example.com/Weekly Freshness");
    assert_eq!((report.found, report.total), (1, 1));
    let state = service.state();
    assert_eq!(state.description.as_deref(), Some("The weekly [FRESH]ness"));
    assert_eq!(state.cover.as_deref(), Some(&[0xff, 0xd8, 0xff][..]));
    assert_eq!(state.tracks["Weekly Freshness"], vec!["spotify:track:1"]);
  }

  #[tokio::test]
  async fn replaces_existing_tracks_and_skips_failed_searches() {
    let service = FakeService::default();
    {
      let mut state = service.state();
      state.playlists.push(Playlist { id: "Weekly Freshness".into(), url: "u".into() });
      state
        .tracks
        .insert("Weekly Freshness".into(), vec!["spotify:track:old".into()]);
      state.catalogue.insert("A - One".into(), "spotify:track:a".into());
      state.failing.push("B - Two".into());
    }

    let titles = vec![
      "[FRESH] A - One".to_owned(),
      "[FRESH] B - Two".to_owned(),
      "[FRESH] C - Unknown".to_owned(),
    ];
    let report = sync_weekly(&service, &titles, &settings()).await.unwrap();

    assert_eq!((report.found, report.total), (1, 3));
    assert_eq!(report.percent, 33.3);
    let state = service.state();
    assert_eq!(state.tracks["Weekly Freshness"], vec!["spotify:track:a"]);
    // Existing playlists keep their metadata.
    assert!(state.description.is_none());
  }

  #[tokio::test]
  async fn adds_tracks_in_batches() {
    let service = FakeService::default();
    let titles: Vec<String> = (0..250).map(|i| format!("[FRESH] Song {i}")).collect();
    {
      let mut state = service.state();
      for i in 0..250 {
        state.catalogue.insert(format!("Song {i}"), format!("spotify:track:{i}"));
      }
    }

    let report = sync_weekly(&service, &titles, &settings()).await.unwrap();

    assert_eq!(report.found, 250);
    assert_eq!(service.state().add_calls, vec![100, 100, 50]);
  }
}
