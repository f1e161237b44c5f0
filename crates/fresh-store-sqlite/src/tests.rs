//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fresh_core::{
  post::Post,
  store::{ArchiveStore, ScoreUpdate},
  subscription::{Cadence, Level, Outcome, Request},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap() }

fn post(id: &str, score: i64, age: Duration) -> Post {
  Post {
    id:        id.into(),
    title:     format!("\\[FRESH\\] Artist - {id}"),
    permalink: format!("https://redd.it/{id}"),
    url:       format!("https://example.com/{id}"),
    created:   now() - age,
    score,
    submitter: "poster".into(),
  }
}

fn ids(posts: &[Post]) -> Vec<&str> { posts.iter().map(|p| p.id.as_str()).collect() }

// ─── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn archive_and_list_round_trip() {
  let s = store().await;
  let original = post("a1", 80, Duration::hours(5));

  let inserted = s.archive_posts(vec![original.clone()]).await.unwrap();
  assert_eq!(inserted, vec!["a1"]);

  let all = s.list_posts().await.unwrap();
  assert_eq!(all, vec![original]);
}

#[tokio::test]
async fn archiving_twice_is_idempotent() {
  let s = store().await;
  let batch = vec![post("a1", 80, Duration::hours(1)), post("a2", 90, Duration::hours(2))];

  s.archive_posts(batch.clone()).await.unwrap();
  let second = s.archive_posts(batch).await.unwrap();

  assert!(second.is_empty());
  assert_eq!(s.list_posts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_ids_in_one_batch_insert_once() {
  let s = store().await;
  let inserted = s
    .archive_posts(vec![post("a1", 80, Duration::hours(1)), post("a1", 95, Duration::hours(1))])
    .await
    .unwrap();

  assert_eq!(inserted, vec!["a1"]);
  let all = s.list_posts().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].score, 80);
}

#[tokio::test]
async fn posts_since_orders_by_score_and_respects_cutoff() {
  let s = store().await;
  s.archive_posts(vec![
    post("low", 60, Duration::hours(2)),
    post("high", 300, Duration::hours(10)),
    post("mid", 150, Duration::hours(20)),
    post("old", 999, Duration::hours(30)),
  ])
  .await
  .unwrap();

  let recent = s.posts_since(now() - Duration::days(1)).await.unwrap();
  assert_eq!(ids(&recent), vec!["high", "mid", "low"]);
}

#[tokio::test]
async fn update_scores_touches_only_named_rows() {
  let s = store().await;
  s.archive_posts(vec![post("a1", 80, Duration::hours(1)), post("a2", 90, Duration::hours(1))])
    .await
    .unwrap();

  let changed = s
    .update_scores(vec![
      ScoreUpdate { id: "a1".into(), score: 200 },
      ScoreUpdate { id: "missing".into(), score: 5 },
    ])
    .await
    .unwrap();
  assert_eq!(changed, 1);

  let mut all = s.list_posts().await.unwrap();
  all.sort_by(|a, b| a.id.cmp(&b.id));
  assert_eq!(all[0].score, 200);
  assert_eq!(all[1].score, 90);
}

#[tokio::test]
async fn sweep_removes_old_or_low_scoring_posts() {
  let s = store().await;
  s.archive_posts(vec![
    post("keep", 80, Duration::days(2)),
    post("stale", 500, Duration::days(32)),
    post("weak", 49, Duration::hours(1)),
    post("edge", 50, Duration::days(30)),
  ])
  .await
  .unwrap();

  let deleted = s.sweep_posts(now() - Duration::days(31), 50).await.unwrap();
  assert_eq!(deleted, 2);

  let mut left = s.list_posts().await.unwrap();
  left.sort_by(|a, b| a.id.cmp(&b.id));
  assert_eq!(ids(&left), vec!["edge", "keep"]);
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn subscribe_twice_does_not_duplicate() {
  let s = store().await;

  let first = s.apply_subscription("alice", Request::Subscribe(Level::Daily)).await.unwrap();
  assert_eq!(first.outcome, Outcome::Subscribed(Level::Daily));

  let again = s.apply_subscription("alice", Request::Subscribe(Level::Daily)).await.unwrap();
  assert_eq!(again.outcome, Outcome::AlreadySubscribed(Level::Daily));

  let counts = s.subscription_counts().await.unwrap();
  assert_eq!(counts.users(), 1);
  assert_eq!(counts.daily, 1);
}

#[tokio::test]
async fn subscribe_to_other_level_becomes_both() {
  let s = store().await;
  s.apply_subscription("alice", Request::Subscribe(Level::Daily)).await.unwrap();
  let t = s.apply_subscription("alice", Request::Subscribe(Level::Weekly)).await.unwrap();

  assert_eq!(t.before, Some(Level::Daily));
  assert_eq!(t.after, Some(Level::Both));
  assert_eq!(s.subscription_counts().await.unwrap().both, 1);
}

#[tokio::test]
async fn unsubscribe_daily_from_both_leaves_weekly() {
  let s = store().await;
  s.apply_subscription("bob", Request::Subscribe(Level::Both)).await.unwrap();
  let t = s.apply_subscription("bob", Request::Unsubscribe(Level::Daily)).await.unwrap();

  assert_eq!(t.after, Some(Level::Weekly));
  assert_eq!(s.subscribers(Cadence::Weekly).await.unwrap(), vec!["bob"]);
  assert!(s.subscribers(Cadence::Daily).await.unwrap().is_empty());
}

#[tokio::test]
async fn unsubscribe_without_row_leaves_store_untouched() {
  let s = store().await;
  s.apply_subscription("carol", Request::Subscribe(Level::Weekly)).await.unwrap();

  let t = s.apply_subscription("dave", Request::Unsubscribe(Level::Both)).await.unwrap();
  assert_eq!(t.outcome, Outcome::NotSubscribed);

  let counts = s.subscription_counts().await.unwrap();
  assert_eq!(counts.users(), 1);
  assert_eq!(counts.weekly, 1);
}

#[tokio::test]
async fn full_unsubscribe_deletes_row() {
  let s = store().await;
  s.apply_subscription("erin", Request::Subscribe(Level::Weekly)).await.unwrap();
  let t = s.apply_subscription("erin", Request::Unsubscribe(Level::Both)).await.unwrap();

  assert_eq!(t.outcome, Outcome::Removed);
  assert_eq!(s.subscription_counts().await.unwrap().users(), 0);
}

#[tokio::test]
async fn subscribers_include_both_level() {
  let s = store().await;
  s.apply_subscription("d", Request::Subscribe(Level::Daily)).await.unwrap();
  s.apply_subscription("w", Request::Subscribe(Level::Weekly)).await.unwrap();
  s.apply_subscription("b", Request::Subscribe(Level::Both)).await.unwrap();

  assert_eq!(s.subscribers(Cadence::Daily).await.unwrap(), vec!["b", "d"]);
  assert_eq!(s.subscribers(Cadence::Weekly).await.unwrap(), vec!["b", "w"]);

  let counts = s.subscription_counts().await.unwrap();
  assert_eq!((counts.daily, counts.weekly, counts.both), (1, 1, 1));
}

// ─── On-disk ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn file_store_persists_across_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("fresh.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.archive_posts(vec![post("a1", 80, Duration::hours(1))]).await.unwrap();
    s.apply_subscription("alice", Request::Subscribe(Level::Weekly)).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.list_posts().await.unwrap().len(), 1);
  assert_eq!(s.subscribers(Cadence::Weekly).await.unwrap(), vec!["alice"]);
}
