//! Digest rendering for the Fresh bot.
//!
//! Turns archived posts into ranked per-day tables, packs them into parts that
//! fit the platform's message limit, and holds every fixed piece of message
//! text. Pure and synchronous; no HTTP or database dependencies.

mod paginate;
mod render;
pub mod templates;

use fresh_core::{post::Post, subscription::Cadence};

pub use paginate::paginate;
pub use render::{DayBlock, day_blocks, day_label, table_row};
pub use templates::Identity;

// ─── Digest ──────────────────────────────────────────────────────────────────

/// A subject/body pair ready to send or post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
  pub subject: String,
  pub body:    String,
}

/// A rendered digest: one or more parts, the footer on the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
  pub cadence: Cadence,
  /// Days covered, oldest first.
  pub blocks:  Vec<DayBlock>,
  pub parts:   Vec<String>,
}

impl Digest {
  /// Render `posts` (highest score first) into a digest.
  ///
  /// Daily digests are a single message. Weekly digests are paginated to
  /// `budget` characters. Returns `None` when there is nothing to send.
  pub fn build(
    cadence: Cadence,
    posts: &[Post],
    identity: &Identity,
    budget: usize,
  ) -> Option<Self> {
    let blocks = day_blocks(posts);
    if blocks.is_empty() {
      return None;
    }

    let intro = identity.intro(cadence);
    let mut parts = match cadence {
      Cadence::Daily => {
        let mut text = intro;
        for block in &blocks {
          text.push_str(&block.text);
        }
        vec![text]
      }
      Cadence::Weekly => paginate(&intro, &blocks, budget),
    };

    if let Some(last) = parts.last_mut() {
      last.push_str(&identity.footer());
    }

    Some(Self { cadence, blocks, parts })
  }

  /// Label of the earliest day in the digest.
  pub fn first_label(&self) -> &str {
    self.blocks.first().map(|b| b.label.as_str()).unwrap_or_default()
  }

  pub fn title(&self) -> String { templates::digest_title(self.cadence, self.first_label()) }

  pub fn is_multipart(&self) -> bool { self.parts.len() > 1 }

  /// One message per part. Multi-part digests number each part in both the
  /// subject and a bold header at the top of the body.
  pub fn messages(&self) -> Vec<Message> {
    let title = self.title();
    if !self.is_multipart() {
      return self
        .parts
        .iter()
        .map(|body| Message { subject: title.clone(), body: body.clone() })
        .collect();
    }

    self
      .parts
      .iter()
      .enumerate()
      .map(|(i, body)| {
        let n = i + 1;
        Message {
          subject: format!("{title}: Part {n}"),
          body:    format!("**Part {n}**\n\n{body}"),
        }
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn identity() -> Identity {
    Identity {
      bot:        "FreshBot".into(),
      admin:      "operator".into(),
      community:  "hiphopheads".into(),
      source_url: None,
    }
  }

  fn post(id: &str, score: i64, day: u32, title_len: usize) -> Post {
    Post {
      id:        id.into(),
      title:     "t".repeat(title_len),
      permalink: format!("https://redd.it/{id}"),
      url:       format!("https://example.com/{id}"),
      created:   Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
      score,
      submitter: "poster".into(),
    }
  }

  #[test]
  fn empty_window_builds_nothing() {
    assert!(Digest::build(Cadence::Daily, &[], &identity(), 9000).is_none());
  }

  #[test]
  fn daily_digest_is_one_part_with_footer() {
    let posts = vec![post("a", 90, 4, 10), post("b", 70, 5, 10)];
    let digest = Digest::build(Cadence::Daily, &posts, &identity(), 9000).unwrap();

    assert_eq!(digest.parts.len(), 1);
    let messages = digest.messages();
    assert_eq!(messages[0].subject, "The Daily Freshness for Monday, March 4, 2024");
    assert!(messages[0].body.starts_with("Welcome to The Daily"));
    assert!(messages[0].body.ends_with(&identity().footer()));
  }

  #[test]
  fn weekly_parts_are_numbered_and_footer_only_on_last() {
    // Each day block is well over a third of the budget.
    let posts: Vec<_> = (4..=6).map(|d| post(&format!("p{d}"), 100, d, 3500)).collect();
    let digest = Digest::build(Cadence::Weekly, &posts, &identity(), 9000).unwrap();

    assert_eq!(digest.parts.len(), 2);
    let messages = digest.messages();
    assert!(messages[0].subject.ends_with(": Part 1"));
    assert!(messages[1].body.starts_with("**Part 2**\n\n"));

    let footer = identity().footer();
    assert!(!messages[0].body.contains(&footer));
    assert!(messages[1].body.ends_with(&footer));
  }
}
