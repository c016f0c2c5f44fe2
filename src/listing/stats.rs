//! Collection-wide summary counts.

use std::collections::BTreeMap;

/// Named counts shown in summary tiles (`total`, `estado.PENDIENTE`, ...).
///
/// Missing keys read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
  counts: BTreeMap<String, u64>,
}

impl Stats {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start from the collection size under the `total` key.
  pub fn with_total(total: usize) -> Self {
    let mut stats = Self::new();
    stats.add("total", total as u64);
    stats
  }

  pub fn get(&self, key: &str) -> u64 {
    self.counts.get(key).copied().unwrap_or(0)
  }

  pub fn total(&self) -> u64 {
    self.get("total")
  }

  pub fn add(&mut self, key: impl Into<String>, n: u64) {
    *self.counts.entry(key.into()).or_insert(0) += n;
  }

  pub fn increment(&mut self, key: impl Into<String>) {
    self.add(key, 1);
  }

  /// Count items under `prefix.<value>` for every value `extract` yields.
  pub fn tally<T, F>(&mut self, items: &[T], prefix: &str, extract: F)
  where
    F: Fn(&T) -> Option<&str>,
  {
    for item in items {
      if let Some(value) = extract(item) {
        self.increment(format!("{}.{}", prefix, value));
      }
    }
  }

  /// Count items matching a predicate under `key`.
  ///
  /// The key is recorded even when nothing matches.
  pub fn count_where<T, F>(&mut self, items: &[T], key: &str, predicate: F)
  where
    F: Fn(&T) -> bool,
  {
    let n = items.iter().filter(|item| predicate(*item)).count();
    self.add(key, n as u64);
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
    self.counts.iter().map(|(k, v)| (k.as_str(), *v))
  }
}
