//! [`ForumClient`] over Reddit's OAuth JSON API.
//!
//! Authenticates as a script app with the password grant, then talks to
//! `oauth.reddit.com` with the bearer token. Requests are spaced at least one
//! second apart to stay inside the API's per-minute quota.

use std::time::Duration;

use fresh_core::{
  forum::{ForumClient, InboxMessage},
  post::{DELETED_AUTHOR, Submission, from_epoch},
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::{sync::Mutex, time::Instant};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
/// Largest page the listing endpoints return.
const PAGE_SIZE: usize = 100;
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);

// ─── Configuration ────────────────────────────────────────────────────────────

/// Script-app credentials for the bot account.
#[derive(Deserialize, Clone)]
pub struct RedditConfig {
  pub client_id:     String,
  pub client_secret: String,
  pub username:      String,
  pub password:      String,
  #[serde(default = "default_user_agent")]
  pub user_agent:    String,
}

fn default_user_agent() -> String {
  format!("freshbot/{} (digest bot)", env!("CARGO_PKG_VERSION"))
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RedditError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} {path} returned {status}")]
  Status {
    method: &'static str,
    path:   String,
    status: StatusCode,
  },

  #[error("authentication failed: {0}")]
  Auth(String),

  #[error("api rejected request: {0}")]
  Api(String),

  #[error("submission not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Timestamp(#[from] fresh_core::Error),
}

type Result<T, E = RedditError> = std::result::Result<T, E>;

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
  access_token: Option<String>,
  #[serde(default)]
  error:        Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
  data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
  after:    Option<String>,
  children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
  data: T,
}

#[derive(Debug, Deserialize)]
struct LinkData {
  id:          String,
  title:       String,
  url:         String,
  created_utc: f64,
  score:       i64,
  #[serde(default)]
  author:      Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageData {
  name:        String,
  #[serde(default)]
  subject:     String,
  #[serde(default)]
  body:        String,
  #[serde(default)]
  author:      Option<String>,
  #[serde(default)]
  was_comment: bool,
  #[serde(default)]
  context:     String,
}

/// Envelope of every `api_type=json` write endpoint.
#[derive(Debug, Deserialize)]
struct ApiResponse {
  json: ApiBody,
}

#[derive(Debug, Deserialize)]
struct ApiBody {
  #[serde(default)]
  errors: Vec<serde_json::Value>,
  #[serde(default)]
  data:   Option<serde_json::Value>,
}

impl ApiResponse {
  fn check(self) -> Result<ApiBody> {
    if self.json.errors.is_empty() {
      Ok(self.json)
    } else {
      Err(RedditError::Api(serde_json::Value::from(self.json.errors).to_string()))
    }
  }
}

impl ApiBody {
  /// Thing name of the object a write created. `/api/submit` puts it at
  /// `data.name`, `/api/comment` under `data.things[0].data.name`.
  fn created_name(&self) -> Option<String> {
    let data = self.data.as_ref()?;
    data
      .pointer("/name")
      .or_else(|| data.pointer("/things/0/data/name"))
      .and_then(|v| v.as_str())
      .map(str::to_owned)
  }
}

fn author_handle(author: Option<String>) -> Option<String> {
  author.filter(|a| a != DELETED_AUTHOR && !a.is_empty())
}

impl LinkData {
  fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      created: from_epoch(self.created_utc as i64)?,
      id:      self.id,
      title:   self.title,
      url:     self.url,
      score:   self.score,
      author:  author_handle(self.author),
    })
  }
}

impl From<MessageData> for InboxMessage {
  fn from(m: MessageData) -> Self {
    Self {
      name:        m.name,
      subject:     m.subject,
      body:        m.body,
      author:      author_handle(m.author),
      was_comment: m.was_comment,
      context:     m.context,
    }
  }
}

// ─── Rate limiting ────────────────────────────────────────────────────────────

struct RateLimiter {
  last_request: Mutex<Option<Instant>>,
  min_interval: Duration,
}

impl RateLimiter {
  fn new(min_interval: Duration) -> Self {
    Self { last_request: Mutex::new(None), min_interval }
  }

  async fn wait(&self) {
    let mut last = self.last_request.lock().await;
    if let Some(at) = *last {
      let elapsed = at.elapsed();
      if elapsed < self.min_interval {
        tokio::time::sleep(self.min_interval - elapsed).await;
      }
    }
    *last = Some(Instant::now());
  }
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// An authenticated session for the bot account, scoped to one community.
pub struct RedditClient {
  client:    Client,
  token:     String,
  subreddit: String,
  limiter:   RateLimiter,
}

impl RedditClient {
  /// Obtain an access token for the configured account.
  pub async fn connect(config: &RedditConfig, subreddit: &str) -> Result<Self> {
    let client = Client::builder()
      .user_agent(&config.user_agent)
      .timeout(Duration::from_secs(30))
      .build()?;

    let resp = client
      .post(TOKEN_URL)
      .basic_auth(&config.client_id, Some(&config.client_secret))
      .form(&[
        ("grant_type", "password"),
        ("username", config.username.as_str()),
        ("password", config.password.as_str()),
      ])
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(RedditError::Auth(format!("token endpoint returned {}", resp.status())));
    }

    let token: TokenResponse = resp.json().await?;
    let token = match (token.access_token, token.error) {
      (Some(token), None) => token,
      (_, Some(error)) => return Err(RedditError::Auth(error)),
      (None, None) => return Err(RedditError::Auth("no access token in response".into())),
    };

    tracing::debug!(user = %config.username, "authenticated with reddit");
    Ok(Self {
      client,
      token,
      subreddit: subreddit.to_owned(),
      limiter: RateLimiter::new(MIN_REQUEST_INTERVAL),
    })
  }

  fn request(&self, req: RequestBuilder) -> RequestBuilder { req.bearer_auth(&self.token) }

  async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
    self.limiter.wait().await;
    let resp = self
      .request(self.client.get(format!("{API_BASE}{path}")))
      .query(&[("raw_json", "1")])
      .query(query)
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(RedditError::Status { method: "GET", path: path.to_owned(), status: resp.status() });
    }
    Ok(resp.json().await?)
  }

  async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<reqwest::Response> {
    self.limiter.wait().await;
    let resp = self
      .request(self.client.post(format!("{API_BASE}{path}")))
      .form(form)
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(RedditError::Status {
        method: "POST",
        path:   path.to_owned(),
        status: resp.status(),
      });
    }
    Ok(resp)
  }

  /// POST to an `api_type=json` endpoint and check its error list.
  async fn post_api(&self, path: &str, form: &[(&str, &str)]) -> Result<ApiBody> {
    let mut form = form.to_vec();
    form.push(("api_type", "json"));
    let resp: ApiResponse = self.post_form(path, &form).await?.json().await?;
    resp.check()
  }

  /// Follow a listing's `after` cursor until `limit` items or the end.
  async fn paged<T: DeserializeOwned>(&self, path: &str, limit: usize) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut after: Option<String> = None;

    while items.len() < limit {
      let page = PAGE_SIZE.min(limit - items.len());
      let mut query = vec![("limit", page.to_string())];
      if let Some(cursor) = &after {
        query.push(("after", cursor.clone()));
      }

      let listing: Listing<T> = self.get(path, &query).await?;
      let fetched = listing.data.children.len();
      items.extend(listing.data.children.into_iter().map(|t| t.data));

      match listing.data.after {
        Some(next) if fetched > 0 => after = Some(next),
        _ => break,
      }
    }

    items.truncate(limit);
    Ok(items)
  }
}

impl ForumClient for RedditClient {
  type Error = RedditError;

  async fn new_submissions(&self, limit: usize) -> Result<Vec<Submission>> {
    let path = format!("/r/{}/new", self.subreddit);
    let links: Vec<LinkData> = self.paged(&path, limit).await?;
    tracing::debug!(fetched = links.len(), "fetched new submissions");
    links.into_iter().map(LinkData::into_submission).collect()
  }

  async fn submission_score(&self, id: &str) -> Result<i64> {
    let listing: Listing<LinkData> =
      self.get("/api/info", &[("id", format!("t3_{id}"))]).await?;
    listing
      .data
      .children
      .into_iter()
      .next()
      .map(|t| t.data.score)
      .ok_or_else(|| RedditError::NotFound(id.to_owned()))
  }

  async fn unread_messages(&self) -> Result<Vec<InboxMessage>> {
    let messages: Vec<MessageData> = self.paged("/message/unread", usize::MAX).await?;
    Ok(messages.into_iter().map(InboxMessage::from).collect())
  }

  async fn mark_read(&self, message: &InboxMessage) -> Result<()> {
    self.post_form("/api/read_message", &[("id", message.name.as_str())]).await?;
    Ok(())
  }

  async fn reply(&self, message: &InboxMessage, body: &str) -> Result<()> {
    self
      .post_api("/api/comment", &[("thing_id", message.name.as_str()), ("text", body)])
      .await?;
    Ok(())
  }

  async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<()> {
    self
      .post_api("/api/compose", &[("to", to), ("subject", subject), ("text", body)])
      .await?;
    Ok(())
  }

  async fn submit_post(&self, community: &str, title: &str, body: &str) -> Result<String> {
    let data = self
      .post_api("/api/submit", &[
        ("sr", community),
        ("kind", "self"),
        ("title", title),
        ("text", body),
      ])
      .await?;
    data
      .created_name()
      .ok_or_else(|| RedditError::Api("submit response carried no post name".into()))
  }

  async fn reply_to_post(&self, parent: &str, body: &str) -> Result<String> {
    let data = self
      .post_api("/api/comment", &[("thing_id", parent), ("text", body)])
      .await?;
    data
      .created_name()
      .ok_or_else(|| RedditError::Api("comment response carried no comment name".into()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn listing_of_links_becomes_submissions() {
    let json = r#"{
      "kind": "Listing",
      "data": {
        "after": "t3_b2",
        "children": [
          {"kind": "t3", "data": {
            "id": "a1", "title": "[FRESH] Artist - Song", "url": "https://example.com/a1",
            "created_utc": 1709553600.0, "score": 120, "author": "poster"
          }},
          {"kind": "t3", "data": {
            "id": "b2", "title": "Discussion", "url": "https://example.com/b2",
            "created_utc": 1709557200.0, "score": 3, "author": "[deleted]"
          }}
        ]
      }
    }"#;
    let listing: Listing<LinkData> = serde_json::from_str(json).unwrap();
    assert_eq!(listing.data.after.as_deref(), Some("t3_b2"));

    let subs: Vec<Submission> = listing
      .data
      .children
      .into_iter()
      .map(|t| t.data.into_submission())
      .collect::<Result<_>>()
      .unwrap();
    assert_eq!(subs[0].id, "a1");
    assert_eq!(subs[0].created.timestamp(), 1_709_553_600);
    assert_eq!(subs[0].author.as_deref(), Some("poster"));
    assert_eq!(subs[1].author, None);
  }

  #[test]
  fn inbox_items_keep_comment_flag_and_context() {
    let json = r#"{
      "kind": "Listing",
      "data": {
        "after": null,
        "children": [
          {"kind": "t4", "data": {
            "name": "t4_x", "subject": "subscribe", "body": "daily", "author": "alice"
          }},
          {"kind": "t1", "data": {
            "name": "t1_y", "subject": "comment reply", "body": "nice", "author": null,
            "was_comment": true, "context": "/r/x/comments/1/_/y/?context=3"
          }}
        ]
      }
    }"#;
    let listing: Listing<MessageData> = serde_json::from_str(json).unwrap();
    let items: Vec<InboxMessage> =
      listing.data.children.into_iter().map(|t| t.data.into()).collect();

    assert_eq!(items[0].author.as_deref(), Some("alice"));
    assert!(!items[0].was_comment);
    assert!(items[1].was_comment);
    assert_eq!(items[1].author, None);
    assert!(items[1].context.ends_with("context=3"));
  }

  #[test]
  fn write_responses_yield_created_names() {
    let submit: ApiResponse = serde_json::from_str(
      r#"{"json": {"errors": [], "data": {"url": "https://redd.it/z", "id": "z", "name": "t3_z"}}}"#,
    )
    .unwrap();
    assert_eq!(submit.check().unwrap().created_name().as_deref(), Some("t3_z"));

    let comment: ApiResponse = serde_json::from_str(
      r#"{"json": {"errors": [], "data": {"things": [{"kind": "t1", "data": {"name": "t1_c"}}]}}}"#,
    )
    .unwrap();
    assert_eq!(comment.check().unwrap().created_name().as_deref(), Some("t1_c"));
  }

  #[test]
  fn api_errors_are_reported() {
    let resp: ApiResponse = serde_json::from_str(
      r#"{"json": {"errors": [["RATELIMIT", "you are doing that too much", "ratelimit"]]}}"#,
    )
    .unwrap();
    assert!(matches!(resp.check(), Err(RedditError::Api(msg)) if msg.contains("RATELIMIT")));
  }
}
