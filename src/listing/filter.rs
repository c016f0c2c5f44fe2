//! Canonical filter state.
//!
//! A [`FilterSet`] only ever holds normalized, non-empty values, so two sets
//! are equal exactly when every field's normalized value matches.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use super::capability::{Capability, FieldKind, FilterField};

/// Derived stock bands for products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StockBand {
  /// stock == 0
  OutOfStock,
  /// 0 < stock <= minimum
  Low,
}

impl StockBand {
  pub fn param(&self) -> &'static str {
    match self {
      StockBand::OutOfStock => "sin_stock",
      StockBand::Low => "stock_bajo",
    }
  }
}

/// Inclusive range of calendar days, either bound optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DateRange {
  pub from: Option<NaiveDate>,
  pub to: Option<NaiveDate>,
}

impl DateRange {
  pub fn is_empty(&self) -> bool {
    self.from.is_none() && self.to.is_none()
  }

  pub fn contains(&self, day: NaiveDate) -> bool {
    self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
  }
}

/// A single filter value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterValue {
  /// Exact-match value or search text
  Text(String),
  Flag(bool),
  Stock(StockBand),
  Dates(DateRange),
}

impl FilterValue {
  pub fn text(value: impl Into<String>) -> Self {
    FilterValue::Text(value.into())
  }

  /// Canonical form of this value, or `None` when it is empty.
  fn normalized(self) -> Option<Self> {
    match self {
      FilterValue::Text(s) => {
        let trimmed = s.trim();
        if trimmed.is_empty() {
          None
        } else if trimmed.len() == s.len() {
          Some(FilterValue::Text(s))
        } else {
          Some(FilterValue::Text(trimmed.to_string()))
        }
      }
      FilterValue::Dates(range) if range.is_empty() => None,
      other => Some(other),
    }
  }

  /// Whether this value can be evaluated for a field of `kind`.
  pub fn fits(&self, kind: FieldKind) -> bool {
    matches!(
      (self, kind),
      (FilterValue::Text(_), FieldKind::Exact | FieldKind::Search)
        | (FilterValue::Flag(_), FieldKind::Flag)
        | (FilterValue::Stock(_), FieldKind::StockBand)
        | (FilterValue::Dates(_), FieldKind::DateRange)
    )
  }
}

impl fmt::Display for FilterValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FilterValue::Text(s) => f.write_str(s),
      FilterValue::Flag(b) => write!(f, "{}", b),
      FilterValue::Stock(band) => f.write_str(band.param()),
      FilterValue::Dates(range) => {
        let from = range.from.map(|d| d.to_string()).unwrap_or_default();
        let to = range.to.map(|d| d.to_string()).unwrap_or_default();
        write!(f, "{}..{}", from, to)
      }
    }
  }
}

/// Normalized mapping from field to value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterSet<F: FilterField> {
  values: BTreeMap<F, FilterValue>,
}

impl<F: FilterField> Default for FilterSet<F> {
  fn default() -> Self {
    Self::new()
  }
}

/// Build a canonical filter set from raw input.
///
/// `None` and empty values are dropped, so `normalize(normalize(raw))`
/// equals `normalize(raw)`.
pub fn normalize<F, I, V>(raw: I) -> FilterSet<F>
where
  F: FilterField,
  I: IntoIterator<Item = (F, V)>,
  V: Into<Option<FilterValue>>,
{
  let mut set = FilterSet::new();
  for (field, value) in raw {
    set.set(field, value);
  }
  set
}

impl<F: FilterField> FilterSet<F> {
  pub fn new() -> Self {
    Self {
      values: BTreeMap::new(),
    }
  }

  pub fn get(&self, field: F) -> Option<&FilterValue> {
    self.values.get(&field)
  }

  /// Set a field; empty values clear it.
  pub fn set(&mut self, field: F, value: impl Into<Option<FilterValue>>) {
    match value.into().and_then(FilterValue::normalized) {
      Some(value) if value.fits(field.kind()) => {
        self.values.insert(field, value);
      }
      Some(value) => {
        warn!(field = field.name(), value = %value, "dropping filter value of the wrong kind");
        self.values.remove(&field);
      }
      None => {
        self.values.remove(&field);
      }
    }
  }

  pub fn clear(&mut self, field: F) {
    self.values.remove(&field);
  }

  /// Set `field` to `value`, or clear it if it already holds `value`.
  ///
  /// Returns whether the field is set afterwards.
  pub fn toggle(&mut self, field: F, value: FilterValue) -> bool {
    let Some(value) = value.normalized() else {
      self.clear(field);
      return false;
    };
    if self.values.get(&field) == Some(&value) {
      self.values.remove(&field);
      false
    } else {
      self.set(field, value);
      self.values.contains_key(&field)
    }
  }

  /// Number of set fields, for UI badges.
  pub fn count_active(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn fields(&self) -> impl Iterator<Item = F> + '_ {
    self.values.keys().copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = (F, &FilterValue)> {
    self.values.iter().map(|(f, v)| (*f, v))
  }

  /// The subset of fields with the given capability.
  pub fn project(&self, capability: Capability) -> Self {
    Self {
      values: self
        .values
        .iter()
        .filter(|(field, _)| field.capability() == capability)
        .map(|(field, value)| (*field, value.clone()))
        .collect(),
    }
  }

  /// Server-native subset, used as the collection cache fingerprint.
  pub fn server_fingerprint(&self) -> Self {
    self.project(Capability::Server)
  }

  /// Render as backend query parameters.
  pub fn query_pairs(&self) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (field, value) in self.iter() {
      let name = field.name();
      match value {
        FilterValue::Dates(range) => {
          if let Some(from) = range.from {
            pairs.push((format!("{}Desde", name), from.format("%Y-%m-%d").to_string()));
          }
          if let Some(to) = range.to {
            pairs.push((format!("{}Hasta", name), to.format("%Y-%m-%d").to_string()));
          }
        }
        other => pairs.push((name.to_string(), other.to_string())),
      }
    }
    pairs
  }
}

impl<F: FilterField> IntoIterator for FilterSet<F> {
  type Item = (F, FilterValue);
  type IntoIter = std::collections::btree_map::IntoIter<F, FilterValue>;

  fn into_iter(self) -> Self::IntoIter {
    self.values.into_iter()
  }
}

impl<F: FilterField> fmt::Display for FilterSet<F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.values.is_empty() {
      return f.write_str("<none>");
    }
    for (i, (field, value)) in self.values.iter().enumerate() {
      if i > 0 {
        f.write_str("&")?;
      }
      write!(f, "{}={}", field.name(), value)?;
    }
    Ok(())
  }
}
