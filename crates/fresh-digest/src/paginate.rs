//! Splitting a digest into parts that fit the platform's message limit.

use crate::render::DayBlock;

/// Pack `intro` followed by `blocks` into parts of at most `budget`
/// characters.
///
/// Blocks are never split. Before a block is appended, the running buffer is
/// flushed as a finished part if adding the block would exceed `budget` and
/// the buffer already holds at least one block, so the intro never ends up
/// alone. A block that is itself larger than `budget` becomes an oversized
/// part. Always returns at least one part.
pub fn paginate(intro: &str, blocks: &[DayBlock], budget: usize) -> Vec<String> {
  let mut parts = Vec::new();
  let mut buffer = intro.to_owned();
  let mut buffer_len = intro.chars().count();
  let mut buffer_has_block = false;

  for block in blocks {
    let block_len = block.len();
    if buffer_has_block && buffer_len + block_len > budget {
      parts.push(std::mem::take(&mut buffer));
      buffer_len = 0;
    }
    buffer.push_str(&block.text);
    buffer_len += block_len;
    buffer_has_block = true;
  }

  parts.push(buffer);
  parts
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn block(day: u32, len: usize) -> DayBlock {
    DayBlock {
      date:  NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
      label: format!("day {day}"),
      text:  "x".repeat(len),
    }
  }

  fn lens(parts: &[String]) -> Vec<usize> { parts.iter().map(|p| p.chars().count()).collect() }

  #[test]
  fn three_4000_blocks_make_two_parts() {
    let intro = "i".repeat(100);
    let blocks = vec![block(1, 4000), block(2, 4000), block(3, 4000)];

    let parts = paginate(&intro, &blocks, 9000);
    assert_eq!(lens(&parts), vec![8100, 4000]);
    assert!(parts[0].starts_with(&intro));
  }

  #[test]
  fn everything_fits_in_one_part() {
    let parts = paginate("intro ", &[block(1, 10), block(2, 10)], 9000);
    assert_eq!(parts.len(), 1);
    assert_eq!(lens(&parts), vec![26]);
  }

  #[test]
  fn exact_budget_is_not_exceeded() {
    let parts = paginate("", &[block(1, 4500), block(2, 4500)], 9000);
    assert_eq!(lens(&parts), vec![9000]);
  }

  #[test]
  fn oversized_block_is_emitted_whole() {
    let parts = paginate("intro", &[block(1, 100), block(2, 12_000), block(3, 100)], 9000);
    assert_eq!(lens(&parts), vec![105, 12_000, 100]);
  }

  #[test]
  fn oversized_first_block_stays_with_intro() {
    let parts = paginate("intro", &[block(1, 12_000)], 9000);
    assert_eq!(lens(&parts), vec![12_005]);
  }

  #[test]
  fn no_blocks_yields_intro_only() {
    assert_eq!(paginate("intro", &[], 9000), vec!["intro".to_owned()]);
  }
}
