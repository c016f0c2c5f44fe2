//! In-memory fixtures for engine tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use color_eyre::{eyre::eyre, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::cache::apply_filters;
use super::capability::{Capability, FieldKind, FilterField};
use super::filter::FilterSet;
use super::stats::Stats;
use super::traits::{Listable, Mutation, RemotePage, Repository, StockLevel};
use super::window::slice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemField {
  Search,
  Category,
  Status,
  Featured,
  Stock,
  Created,
}

impl FilterField for ItemField {
  fn name(&self) -> &'static str {
    match self {
      ItemField::Search => "busqueda",
      ItemField::Category => "categoria",
      ItemField::Status => "estado",
      ItemField::Featured => "destacado",
      ItemField::Stock => "stock",
      ItemField::Created => "fecha",
    }
  }

  fn kind(&self) -> FieldKind {
    match self {
      ItemField::Search => FieldKind::Search,
      ItemField::Category | ItemField::Status => FieldKind::Exact,
      ItemField::Featured => FieldKind::Flag,
      ItemField::Stock => FieldKind::StockBand,
      ItemField::Created => FieldKind::DateRange,
    }
  }

  fn capability(&self) -> Capability {
    match self {
      ItemField::Search | ItemField::Category => Capability::Server,
      _ => Capability::Local,
    }
  }
}

impl ItemField {
  pub const ALL: [ItemField; 6] = [
    ItemField::Search,
    ItemField::Category,
    ItemField::Status,
    ItemField::Featured,
    ItemField::Stock,
    ItemField::Created,
  ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
  pub id: u64,
  pub number: String,
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub status: String,
  pub category: String,
  pub featured: bool,
  pub stock: i64,
  pub minimum: i64,
  pub created: DateTime<Utc>,
}

/// Build an item; `name` is "First Last".
pub fn item(id: u64, status: &str, category: &str, name: &str) -> Item {
  let (first, last) = name.split_once(' ').unwrap_or((name, ""));
  Item {
    id,
    number: format!("PED-{:04}", id),
    first_name: first.to_string(),
    last_name: last.to_string(),
    email: format!("{}@tienda.test", name.to_lowercase().replace(' ', ".")),
    status: status.to_string(),
    category: category.to_string(),
    featured: false,
    stock: 10,
    minimum: 5,
    created: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
  }
}

impl Listable for Item {
  type Field = ItemField;

  fn id(&self) -> u64 {
    self.id
  }

  fn exact(&self, field: ItemField) -> Option<&str> {
    match field {
      ItemField::Status => Some(&self.status),
      ItemField::Category => Some(&self.category),
      _ => None,
    }
  }

  fn flag(&self, field: ItemField) -> Option<bool> {
    match field {
      ItemField::Featured => Some(self.featured),
      _ => None,
    }
  }

  fn stock(&self) -> Option<StockLevel> {
    Some(StockLevel {
      on_hand: self.stock,
      minimum: self.minimum,
    })
  }

  fn timestamp(&self, field: ItemField) -> Option<DateTime<Utc>> {
    match field {
      ItemField::Created => Some(self.created),
      _ => None,
    }
  }

  fn search_text(&self) -> Vec<&str> {
    vec![
      self.number.as_str(),
      self.first_name.as_str(),
      self.last_name.as_str(),
      self.email.as_str(),
    ]
  }

  fn summarize(items: &[Self]) -> Stats {
    let mut stats = Stats::with_total(items.len());
    stats.tally(items, "estado", |i| Some(i.status.as_str()));
    stats
  }
}

/// A backend call as seen by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCall {
  pub page: usize,
  pub page_size: usize,
  pub filters: String,
}

type Latency<F> = Box<dyn Fn(&FilterSet<F>, usize) -> Duration + Send + Sync>;

/// Repository over a `Vec`, evaluating server-native filters itself.
pub struct FakeRepository<E: Listable> {
  items: Mutex<Vec<E>>,
  calls: Mutex<Vec<PageCall>>,
  bulk: bool,
  bulk_calls: AtomicUsize,
  mutations: AtomicUsize,
  failing: AtomicBool,
  latency: Latency<E::Field>,
}

impl<E: Listable> FakeRepository<E> {
  pub fn new(items: Vec<E>) -> Self {
    Self {
      items: Mutex::new(items),
      calls: Mutex::new(Vec::new()),
      bulk: false,
      bulk_calls: AtomicUsize::new(0),
      mutations: AtomicUsize::new(0),
      failing: AtomicBool::new(false),
      latency: Box::new(|_, _| Duration::from_millis(5)),
    }
  }

  /// Offer a bulk `list_all` endpoint.
  pub fn with_bulk(mut self) -> Self {
    self.bulk = true;
    self
  }

  /// Simulated latency per call, from the filters and page size it receives.
  pub fn with_latency<F>(mut self, latency: F) -> Self
  where
    F: Fn(&FilterSet<E::Field>, usize) -> Duration + Send + Sync + 'static,
  {
    self.latency = Box::new(latency);
    self
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub fn calls(&self) -> Vec<PageCall> {
    self.calls.lock().unwrap().clone()
  }

  /// Paged calls made with the given page size.
  pub fn calls_with_size(&self, page_size: usize) -> Vec<PageCall> {
    self
      .calls()
      .into_iter()
      .filter(|c| c.page_size == page_size)
      .collect()
  }

  pub fn bulk_calls(&self) -> usize {
    self.bulk_calls.load(Ordering::SeqCst)
  }

  pub fn mutation_count(&self) -> usize {
    self.mutations.load(Ordering::SeqCst)
  }

  pub fn len(&self) -> usize {
    self.items.lock().unwrap().len()
  }

  fn check(&self) -> Result<()> {
    if self.failing.load(Ordering::SeqCst) {
      Err(eyre!("backend unavailable"))
    } else {
      Ok(())
    }
  }
}

#[async_trait]
impl<E: Listable> Repository<E> for FakeRepository<E> {
  async fn list_paged(
    &self,
    page: usize,
    page_size: usize,
    filters: &FilterSet<E::Field>,
  ) -> Result<RemotePage<E>> {
    self.calls.lock().unwrap().push(PageCall {
      page,
      page_size,
      filters: filters.to_string(),
    });
    tokio::time::sleep((self.latency)(filters, page_size)).await;
    self.check()?;

    let matching = apply_filters(&self.items.lock().unwrap(), filters);
    let total = matching.len() as u64;
    let (items, _, _) = slice(&matching, page, page_size);
    // Pages past the end come back empty, like a real backend
    let items = if (page - 1) * page_size >= matching.len() {
      Vec::new()
    } else {
      items
    };
    Ok(RemotePage { items, total, page })
  }

  async fn list_all(&self, filters: &FilterSet<E::Field>) -> Result<Option<Vec<E>>> {
    if !self.bulk {
      return Ok(None);
    }
    self.bulk_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep((self.latency)(filters, 0)).await;
    self.check()?;
    Ok(Some(apply_filters(&self.items.lock().unwrap(), filters)))
  }

  async fn mutate(&self, mutation: Mutation<E>) -> Result<Option<E>> {
    self.mutations.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(5)).await;
    self.check()?;

    let mut items = self.items.lock().unwrap();
    match mutation {
      Mutation::Create(entity) => {
        items.push(entity.clone());
        Ok(Some(entity))
      }
      Mutation::Update(entity) => {
        let slot = items
          .iter_mut()
          .find(|i| i.id() == entity.id())
          .ok_or_else(|| eyre!("not found: {}", entity.id()))?;
        *slot = entity.clone();
        Ok(Some(entity))
      }
      Mutation::Delete(id) => {
        let before = items.len();
        items.retain(|i| i.id() != id);
        if items.len() == before {
          return Err(eyre!("not found: {}", id));
        }
        Ok(None)
      }
      Mutation::ChangeStatus { .. } => Ok(None),
    }
  }
}
