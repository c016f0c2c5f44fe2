//! Core traits and types shared by the listing engine and its backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::Result;

use super::capability::FilterField;
use super::filter::{FilterSet, StockBand};
use super::stats::Stats;

/// Stock on hand against the reorder threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
  pub on_hand: i64,
  pub minimum: i64,
}

impl StockLevel {
  /// `OutOfStock` at zero, `Low` while `0 < on_hand <= minimum`.
  pub fn band(&self) -> Option<StockBand> {
    if self.on_hand == 0 {
      Some(StockBand::OutOfStock)
    } else if self.on_hand > 0 && self.on_hand <= self.minimum {
      Some(StockBand::Low)
    } else {
      None
    }
  }
}

/// An entity that can be shown in an adaptive list.
///
/// Accessors return `None` when the entity has no value for a field; such
/// entities never match a filter on that field.
pub trait Listable: Clone + Send + Sync + 'static {
  type Field: FilterField;

  /// Stable identifier, used for the deterministic sort before paging
  fn id(&self) -> u64;

  /// Value of an exact-match field (status, category, type)
  fn exact(&self, _field: Self::Field) -> Option<&str> {
    None
  }

  fn flag(&self, _field: Self::Field) -> Option<bool> {
    None
  }

  fn stock(&self) -> Option<StockLevel> {
    None
  }

  /// Timestamp for a date-range field
  fn timestamp(&self, _field: Self::Field) -> Option<DateTime<Utc>> {
    None
  }

  /// Values searched by free-text filters (order number, names, email...)
  fn search_text(&self) -> Vec<&str>;

  /// Collection-wide counts for summary tiles
  fn summarize(items: &[Self]) -> Stats;
}

/// One page as returned by the backend.
#[derive(Debug, Clone)]
pub struct RemotePage<E> {
  pub items: Vec<E>,
  pub total: u64,
  pub page: usize,
}

/// Write operations a screen can perform.
#[derive(Debug, Clone)]
pub enum Mutation<E> {
  Create(E),
  Update(E),
  Delete(u64),
  ChangeStatus { id: u64, status: String },
}

impl<E> Mutation<E> {
  pub fn label(&self) -> &'static str {
    match self {
      Mutation::Create(_) => "create",
      Mutation::Update(_) => "update",
      Mutation::Delete(_) => "delete",
      Mutation::ChangeStatus { .. } => "status change",
    }
  }
}

/// Backend contract consumed by the engine.
#[async_trait]
pub trait Repository<E: Listable>: Send + Sync {
  /// Fetch one page (1-based) narrowed by server-native filters.
  async fn list_paged(
    &self,
    page: usize,
    page_size: usize,
    filters: &FilterSet<E::Field>,
  ) -> Result<RemotePage<E>>;

  /// Bulk endpoint, if the backend has one.
  ///
  /// `Ok(None)` means the engine synthesizes the collection from pages.
  async fn list_all(&self, _filters: &FilterSet<E::Field>) -> Result<Option<Vec<E>>> {
    Ok(None)
  }

  async fn mutate(&self, mutation: Mutation<E>) -> Result<Option<E>>;
}
