//! Subscriber statistics for the `stats` operation.

use fresh_core::store::SubscriptionCounts;

/// Render `counts` as a two-column plain-text table.
pub fn render_counts(counts: &SubscriptionCounts) -> String {
  let rows = [
    ("Users", counts.users()),
    ("Both", counts.both),
    ("Daily", counts.daily),
    ("Weekly", counts.weekly),
  ];
  let label_width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0).max("Type".len());
  let value_width = rows
    .iter()
    .map(|(_, n)| n.to_string().len())
    .max()
    .unwrap_or(0)
    .max("Number".len());

  let mut out = format!("| {:<label_width$} | {:>value_width$} |\n", "Type", "Number");
  out.push_str(&format!("|-{}-+-{}-|\n", "-".repeat(label_width), "-".repeat(value_width)));
  for (label, n) in rows {
    out.push_str(&format!("| {label:<label_width$} | {n:>value_width$} |\n"));
  }
  out
}
