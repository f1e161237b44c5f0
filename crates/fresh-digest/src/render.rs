//! Day bucketing and table rendering.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use fresh_core::post::Post;

/// Display format for a day header, e.g. `Monday, March 4, 2024`.
const DAY_LABEL_FORMAT: &str = "%A, %B %-d, %Y";

const TABLE_HEADER: &str = "Post | Link | Score | User\n:--|:--|:--|:--\n";

/// One rendered day of a digest.
///
/// `date` is carried alongside the display label so ordering never depends on
/// parsing `label` back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBlock {
  pub date:  NaiveDate,
  pub label: String,
  pub text:  String,
}

impl DayBlock {
  /// Length in characters, the unit the message limit is counted in.
  pub fn len(&self) -> usize { self.text.chars().count() }

  pub fn is_empty(&self) -> bool { self.text.is_empty() }
}

pub fn day_label(date: NaiveDate) -> String { date.format(DAY_LABEL_FORMAT).to_string() }

/// One table row: `[title](url) | [link](permalink) | score | /u/submitter`.
pub fn table_row(post: &Post) -> String {
  format!(
    "[{}]({}) | [link]({}) | {} | /u/{}\n",
    post.title, post.url, post.permalink, post.score, post.submitter
  )
}

/// Group `posts` by their UTC creation date and render one block per day.
///
/// Rows keep the order of `posts` within each day, so callers pass them
/// highest score first. Blocks come out in ascending date order.
pub fn day_blocks(posts: &[Post]) -> Vec<DayBlock> {
  let mut days: BTreeMap<NaiveDate, Vec<&Post>> = BTreeMap::new();
  for post in posts {
    days.entry(post.created.date_naive()).or_default().push(post);
  }

  days
    .into_iter()
    .map(|(date, posts)| {
      let label = day_label(date);
      let mut text = format!("**{label}**\n\n{TABLE_HEADER}");
      for post in posts {
        text.push_str(&table_row(post));
      }
      text.push_str("\n\n");
      DayBlock { date, label, text }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn post(id: &str, score: i64, day: u32, hour: u32) -> Post {
    Post {
      id:        id.into(),
      title:     format!("\\[FRESH\\] {id}"),
      permalink: format!("https://redd.it/{id}"),
      url:       format!("https://example.com/{id}"),
      created:   Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
      score,
      submitter: "poster".into(),
    }
  }

  fn row_ids(block: &DayBlock) -> Vec<&str> {
    block
      .text
      .lines()
      .filter_map(|l| l.strip_prefix("[\\[FRESH\\] "))
      .map(|l| l.split(']').next().unwrap_or_default())
      .collect()
  }

  #[test]
  fn label_uses_day_of_month() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    assert_eq!(day_label(date), "Monday, March 4, 2024");
  }

  #[test]
  fn row_has_four_columns() {
    let row = table_row(&post("p1", 80, 4, 10));
    assert_eq!(
      row,
      "[\\[FRESH\\] p1](https://example.com/p1) | [link](https://redd.it/p1) | 80 | /u/poster\n"
    );
  }

  #[test]
  fn three_days_make_three_chronological_blocks() {
    // Input is score-descending, as the store returns it.
    let posts = vec![
      post("c", 400, 6, 9),
      post("a", 300, 4, 9),
      post("b", 200, 5, 9),
      post("a2", 150, 4, 20),
      post("c2", 60, 6, 1),
    ];

    let blocks = day_blocks(&posts);
    assert_eq!(blocks.len(), 3);

    let dates: Vec<_> = blocks.iter().map(|b| b.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-03-04", "2024-03-05", "2024-03-06"]);

    assert_eq!(row_ids(&blocks[0]), vec!["a", "a2"]);
    assert_eq!(row_ids(&blocks[1]), vec!["b"]);
    assert_eq!(row_ids(&blocks[2]), vec!["c", "c2"]);
    assert!(blocks[0].text.starts_with("**Monday, March 4, 2024**\n\n"));
  }

  #[test]
  fn no_posts_no_blocks() {
    assert!(day_blocks(&[]).is_empty());
  }
}
