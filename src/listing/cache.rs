//! In-memory collection cache and local filter evaluation.

use chrono::{DateTime, Local, Utc};

use super::capability::{FieldKind, FilterField};
use super::filter::{FilterSet, FilterValue};
use super::traits::Listable;
use super::window::{paginate, ListPage};

/// The full collection narrowed by one server-side fingerprint.
///
/// Owned by a single engine. Replaced wholesale, never patched.
#[derive(Debug, Clone)]
pub struct CollectionCache<E: Listable> {
  items: Vec<E>,
  fingerprint: FilterSet<E::Field>,
  fetched_at: DateTime<Utc>,
}

impl<E: Listable> CollectionCache<E> {
  pub fn new(items: Vec<E>, fingerprint: FilterSet<E::Field>) -> Self {
    Self {
      items,
      fingerprint,
      fetched_at: Utc::now(),
    }
  }

  pub fn items(&self) -> &[E] {
    &self.items
  }

  pub fn fingerprint(&self) -> &FilterSet<E::Field> {
    &self.fingerprint
  }

  pub fn fetched_at(&self) -> DateTime<Utc> {
    self.fetched_at
  }

  /// Whether this cache can serve `filters` without a refetch.
  pub fn serves(&self, filters: &FilterSet<E::Field>) -> bool {
    self.fingerprint == filters.server_fingerprint()
  }

  /// Filter, sort and cut one page.
  pub fn page(&self, filters: &FilterSet<E::Field>, page: usize, page_size: usize) -> ListPage<E> {
    local_page(&self.items, filters, page, page_size)
  }
}

/// Filter, sort and cut one page out of a full collection.
pub fn local_page<E: Listable>(
  items: &[E],
  filters: &FilterSet<E::Field>,
  page: usize,
  page_size: usize,
) -> ListPage<E> {
  let filtered = apply_filters(items, filters);
  paginate(&filtered, page, page_size)
}

/// Evaluate every active filter and sort the survivors by id.
///
/// All groups are ANDed; a search value matches if any of the entity's
/// search fields contains it.
pub fn apply_filters<E: Listable>(items: &[E], filters: &FilterSet<E::Field>) -> Vec<E> {
  let mut active: Vec<(E::Field, &FilterValue)> = filters.iter().collect();
  // FieldKind's declaration order is the evaluation order
  active.sort_by_key(|(field, _)| field.kind());

  let mut result: Vec<E> = items
    .iter()
    .filter(|item| active.iter().all(|(field, value)| matches(*item, *field, value)))
    .cloned()
    .collect();

  result.sort_by_key(|item| item.id());
  result
}

fn matches<E: Listable>(item: &E, field: E::Field, value: &FilterValue) -> bool {
  match (field.kind(), value) {
    (FieldKind::Exact, FilterValue::Text(expected)) => item.exact(field) == Some(expected.as_str()),
    (FieldKind::Flag, FilterValue::Flag(expected)) => item.flag(field) == Some(*expected),
    (FieldKind::StockBand, FilterValue::Stock(band)) => {
      item.stock().and_then(|level| level.band()) == Some(*band)
    }
    (FieldKind::DateRange, FilterValue::Dates(range)) => item
      .timestamp(field)
      .map_or(false, |ts| range.contains(ts.with_timezone(&Local).date_naive())),
    (FieldKind::Search, FilterValue::Text(needle)) => {
      let needle = needle.to_lowercase();
      item
        .search_text()
        .iter()
        .any(|hay| hay.to_lowercase().contains(&needle))
    }
    // FilterSet never stores a value of the wrong kind
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listing::filter::{normalize, DateRange, StockBand};
  use crate::listing::testing::{item, Item, ItemField};
  use chrono::{NaiveDate, TimeZone};

  fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Local
      .with_ymd_and_hms(y, m, d, h, min, s)
      .single()
      .unwrap()
      .with_timezone(&Utc)
  }

  fn catalog() -> Vec<Item> {
    vec![
      Item {
        stock: 0,
        featured: true,
        ..item(5, "PENDIENTE", "ropa", "Ana Pérez")
      },
      Item {
        stock: 2,
        ..item(3, "PAGADO", "ropa", "Bruno Díaz")
      },
      Item {
        stock: 9,
        featured: true,
        ..item(1, "PENDIENTE", "hogar", "Carla Ana")
      },
      Item {
        stock: 4,
        ..item(4, "ENVIADO", "hogar", "Diego Luna")
      },
      Item {
        stock: 5,
        ..item(2, "PENDIENTE", "ropa", "Elena Ruiz")
      },
    ]
  }

  fn ids(items: &[Item]) -> Vec<u64> {
    items.iter().map(|i| i.id).collect()
  }

  #[test]
  fn test_no_filters_sorts_by_id() {
    let result = apply_filters(&catalog(), &FilterSet::new());
    assert_eq!(ids(&result), vec![1, 2, 3, 4, 5]);
  }

  #[test]
  fn test_exact_and_flag_are_anded() {
    let filters = normalize(vec![
      (ItemField::Status, FilterValue::text("PENDIENTE")),
      (ItemField::Featured, FilterValue::Flag(true)),
    ]);
    assert_eq!(ids(&apply_filters(&catalog(), &filters)), vec![1, 5]);
  }

  #[test]
  fn test_stock_bands() {
    // minimum is 5 for every test item
    let out = normalize(vec![(ItemField::Stock, FilterValue::Stock(StockBand::OutOfStock))]);
    assert_eq!(ids(&apply_filters(&catalog(), &out)), vec![5]);

    let low = normalize(vec![(ItemField::Stock, FilterValue::Stock(StockBand::Low))]);
    assert_eq!(ids(&apply_filters(&catalog(), &low)), vec![2, 3, 4]);
  }

  #[test]
  fn test_search_is_case_insensitive_or_across_fields() {
    let filters = normalize(vec![(ItemField::Search, FilterValue::text("ANA"))]);
    // Matches first name of 5 and last name of 1
    assert_eq!(ids(&apply_filters(&catalog(), &filters)), vec![1, 5]);

    let by_email = normalize(vec![(ItemField::Search, FilterValue::text("luna@"))]);
    assert_eq!(ids(&apply_filters(&catalog(), &by_email)), vec![4]);
  }

  #[test]
  fn test_search_anded_with_other_groups() {
    let filters = normalize(vec![
      (ItemField::Search, FilterValue::text("ana")),
      (ItemField::Category, FilterValue::text("hogar")),
    ]);
    assert_eq!(ids(&apply_filters(&catalog(), &filters)), vec![1]);
  }

  #[test]
  fn test_date_range_uses_local_day_bounds() {
    let mut items = catalog();
    items[0].created = local(2024, 6, 10, 0, 0, 0); // id 5, first instant of the day
    items[1].created = local(2024, 6, 12, 23, 59, 59); // id 3, last second of the day
    items[2].created = local(2024, 6, 13, 0, 0, 0); // id 1, next day
    items[3].created = local(2024, 6, 9, 23, 59, 59); // id 4, day before
    items[4].created = local(2024, 6, 11, 12, 0, 0); // id 2

    let filters = normalize(vec![(
      ItemField::Created,
      FilterValue::Dates(DateRange {
        from: NaiveDate::from_ymd_opt(2024, 6, 10),
        to: NaiveDate::from_ymd_opt(2024, 6, 12),
      }),
    )]);
    assert_eq!(ids(&apply_filters(&items, &filters)), vec![2, 3, 5]);
  }

  #[test]
  fn test_pages_partition_filtered_set() {
    let items: Vec<Item> = (1..=37)
      .map(|id| {
        let status = if id % 3 == 0 { "PAGADO" } else { "PENDIENTE" };
        Item {
          stock: (id % 7) as i64,
          featured: id % 2 == 0,
          ..item(id, status, "ropa", "Nombre Apellido")
        }
      })
      .collect();

    let sets = vec![
      FilterSet::new(),
      normalize(vec![(ItemField::Status, FilterValue::text("PENDIENTE"))]),
      normalize(vec![
        (ItemField::Featured, FilterValue::Flag(true)),
        (ItemField::Stock, FilterValue::Stock(StockBand::Low)),
      ]),
      normalize(vec![(ItemField::Status, FilterValue::text("CANCELADO"))]),
    ];

    for filters in sets {
      let expected = items
        .iter()
        .filter(|i| filters.iter().all(|(f, v)| matches(*i, f, v)))
        .count();
      let first = local_page(&items, &filters, 1, 10);
      let seen: usize = (1..=first.total_pages)
        .map(|p| local_page(&items, &filters, p, 10).items.len())
        .sum();
      assert_eq!(seen, expected, "{}", filters);
      assert_eq!(first.total, expected as u64);
    }
  }

  #[test]
  fn test_cache_serves_matching_fingerprint() {
    let fingerprint = normalize(vec![(ItemField::Category, FilterValue::text("ropa"))]);
    let cache = CollectionCache::new(catalog(), fingerprint);

    let same_server = normalize(vec![
      (ItemField::Category, FilterValue::text("ropa")),
      (ItemField::Status, FilterValue::text("PAGADO")),
    ]);
    assert!(cache.serves(&same_server));

    let other_server = normalize(vec![(ItemField::Category, FilterValue::text("hogar"))]);
    assert!(!cache.serves(&other_server));
  }
}
