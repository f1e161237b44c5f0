//! Async HTTP client for the Spotify Web API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;

use crate::weekly::{Playlist, PlaylistService};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

/// App credentials plus a user refresh token with the
/// `playlist-modify-public` and `ugc-image-upload` scopes.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
  pub client_id:     String,
  pub client_secret: String,
  pub refresh_token: String,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
}

#[derive(Deserialize)]
struct Me {
  id: String,
}

#[derive(Deserialize)]
struct Page<T> {
  items: Vec<T>,
  next:  Option<String>,
}

#[derive(Deserialize)]
struct ExternalUrls {
  #[serde(default)]
  spotify: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistObject {
  id:            String,
  name:          String,
  external_urls: ExternalUrls,
}

impl From<PlaylistObject> for Playlist {
  fn from(p: PlaylistObject) -> Self {
    let url = p
      .external_urls
      .spotify
      .unwrap_or_else(|| format!("https://open.spotify.com/playlist/{}", p.id));
    Self { id: p.id, url }
  }
}

#[derive(Deserialize)]
struct Track {
  uri: String,
}

#[derive(Deserialize)]
struct PlaylistItem {
  /// `null` for tracks no longer available.
  track: Option<Track>,
}

#[derive(Deserialize)]
struct SearchResponse {
  tracks: Page<Track>,
}

/// An authenticated Spotify session for one user.
pub struct SpotifyClient {
  client:  Client,
  token:   String,
  user_id: String,
}

impl SpotifyClient {
  /// Exchange the refresh token for an access token and look up the user.
  pub async fn connect(config: &SpotifyConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;

    let resp = client
      .post(TOKEN_URL)
      .basic_auth(&config.client_id, Some(&config.client_secret))
      .form(&[
        ("grant_type", "refresh_token"),
        ("refresh_token", config.refresh_token.as_str()),
      ])
      .send()
      .await
      .context("POST /api/token failed")?;
    let token: TokenResponse = expect_success(resp, "POST /api/token")
      .await?
      .json()
      .await
      .context("deserialising access token")?;

    let mut session = Self { client, token: token.access_token, user_id: String::new() };
    let me: Me = session.get_json(&format!("{API_BASE}/me"), &[]).await?;
    session.user_id = me.id;
    tracing::debug!(user = %session.user_id, "authenticated with spotify");
    Ok(session)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder { req.bearer_auth(&self.token) }

  async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
    let resp = self
      .auth(self.client.get(url))
      .query(query)
      .send()
      .await
      .with_context(|| format!("GET {url} failed"))?;
    expect_success(resp, url)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {url}"))
  }

  /// Follow `next` links until the last page.
  async fn all_pages<T: DeserializeOwned>(&self, first: String) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut next = Some(first);
    while let Some(url) = next {
      let page: Page<T> = self.get_json(&url, &[]).await?;
      items.extend(page.items);
      next = page.next;
    }
    Ok(items)
  }
}

async fn expect_success(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(anyhow!("{what} → {status}: {body}"))
}

impl PlaylistService for SpotifyClient {
  async fn find_playlist(&self, name: &str) -> Result<Option<Playlist>> {
    let playlists: Vec<PlaylistObject> =
      self.all_pages(format!("{API_BASE}/me/playlists?limit=50")).await?;
    Ok(playlists.into_iter().find(|p| p.name == name).map(Playlist::from))
  }

  async fn create_playlist(&self, name: &str) -> Result<Playlist> {
    let url = format!("{API_BASE}/users/{}/playlists", self.user_id);
    let resp = self
      .auth(self.client.post(&url))
      .json(&json!({ "name": name, "public": true }))
      .send()
      .await
      .context("POST /playlists failed")?;
    let created: PlaylistObject = expect_success(resp, "POST /playlists")
      .await?
      .json()
      .await
      .context("deserialising created playlist")?;
    Ok(created.into())
  }

  async fn update_description(&self, playlist_id: &str, description: &str) -> Result<()> {
    let resp = self
      .auth(self.client.put(format!("{API_BASE}/playlists/{playlist_id}")))
      .json(&json!({ "description": description }))
      .send()
      .await
      .context("PUT /playlists/{id} failed")?;
    expect_success(resp, "PUT /playlists/{id}").await?;
    Ok(())
  }

  async fn upload_cover(&self, playlist_id: &str, jpeg: &[u8]) -> Result<()> {
    let resp = self
      .auth(self.client.put(format!("{API_BASE}/playlists/{playlist_id}/images")))
      .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
      .body(STANDARD.encode(jpeg))
      .send()
      .await
      .context("PUT /playlists/{id}/images failed")?;
    expect_success(resp, "PUT /playlists/{id}/images").await?;
    Ok(())
  }

  async fn search_track(&self, query: &str) -> Result<Option<String>> {
    let found: SearchResponse = self
      .get_json(&format!("{API_BASE}/search"), &[
        ("q", query),
        ("type", "track"),
        ("limit", "1"),
      ])
      .await?;
    Ok(found.tracks.items.into_iter().next().map(|t| t.uri))
  }

  async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<String>> {
    let items: Vec<PlaylistItem> = self
      .all_pages(format!(
        "{API_BASE}/playlists/{playlist_id}/tracks?limit=100&fields=items(track(uri)),next"
      ))
      .await?;
    Ok(items.into_iter().filter_map(|i| i.track).map(|t| t.uri).collect())
  }

  async fn remove_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
    let tracks: Vec<_> = uris.iter().map(|uri| json!({ "uri": uri })).collect();
    let resp = self
      .auth(self.client.delete(format!("{API_BASE}/playlists/{playlist_id}/tracks")))
      .json(&json!({ "tracks": tracks }))
      .send()
      .await
      .context("DELETE /playlists/{id}/tracks failed")?;
    expect_success(resp, "DELETE /playlists/{id}/tracks").await?;
    Ok(())
  }

  async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
    let resp = self
      .auth(self.client.post(format!("{API_BASE}/playlists/{playlist_id}/tracks")))
      .json(&json!({ "uris": uris }))
      .send()
      .await
      .context("POST /playlists/{id}/tracks failed")?;
    expect_success(resp, "POST /playlists/{id}/tracks").await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn playlist_tracks_skip_unavailable_items() {
    let page: Page<PlaylistItem> = serde_json::from_str(
      r#"{"items": [{"track": {"uri": "spotify:track:1"}}, {"track": null}], "next": null}"#,
    )
    .unwrap();
    let uris: Vec<_> = page.items.into_iter().filter_map(|i| i.track).map(|t| t.uri).collect();
    assert_eq!(uris, vec!["spotify:track:1"]);
    assert!(page.next.is_none());
  }

  #[test]
  fn playlist_url_falls_back_to_the_public_link() {
    let p: PlaylistObject =
      serde_json::from_str(r#"{"id": "abc", "name": "Weekly", "external_urls": {}}"#).unwrap();
    assert_eq!(Playlist::from(p).url, "https://open.spotify.com/playlist/abc");
  }
}
