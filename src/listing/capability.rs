//! Static per-entity classification of filter fields.

use std::fmt::Debug;

use super::filter::FilterSet;

/// Whether the backend can evaluate a field during a paginated query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
  /// Sent to the backend as a query parameter
  Server,
  /// Only evaluated once the whole collection is in memory
  Local,
}

/// How a field's predicate is evaluated against an entity.
///
/// The declaration order is the order in which local predicates run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
  /// Status, category, type: exact string equality
  Exact,
  /// Boolean flags such as "featured"
  Flag,
  /// Derived stock bands
  StockBand,
  /// Inclusive calendar-day ranges
  DateRange,
  /// Case-insensitive substring search over several fields
  Search,
}

/// Paging strategy chosen for a filter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
  /// Backend pages and filters
  #[default]
  Remote,
  /// Full collection fetched once, filtered and paged in memory
  Local,
}

impl Strategy {
  pub fn label(&self) -> &'static str {
    match self {
      Strategy::Remote => "remote",
      Strategy::Local => "local",
    }
  }
}

impl std::fmt::Display for Strategy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// A filterable field of one entity type.
///
/// Implemented by a small `Copy` enum per screen. The declared capability and
/// kind are static: they never depend on the value being filtered.
pub trait FilterField: Copy + Ord + Eq + std::hash::Hash + Debug + Send + Sync + 'static {
  /// Name used as the backend query parameter and in logs
  fn name(&self) -> &'static str;

  /// How the field is matched locally
  fn kind(&self) -> FieldKind;

  /// Whether the backend understands this field
  fn capability(&self) -> Capability;
}

/// Classify a field as server-native or local-only.
pub fn classify<F: FilterField>(field: F) -> Capability {
  field.capability()
}

/// LOCAL if any local-only field is set, REMOTE otherwise.
pub fn decide<F: FilterField>(filters: &FilterSet<F>) -> Strategy {
  if filters
    .fields()
    .any(|field| classify(field) == Capability::Local)
  {
    Strategy::Local
  } else {
    Strategy::Remote
  }
}
