//! Paged backend access: single pages and whole collections.

use color_eyre::Result;
use futures::{stream, Stream, TryStreamExt};
use tracing::debug;

use super::filter::FilterSet;
use super::traits::{Listable, RemotePage, Repository};
use super::window::{total_pages, ListPage};

/// Fetch one display page with server-native filters.
///
/// The returned page keeps the requested page number even when it lies
/// past the end; callers clamp against `total_pages`.
pub async fn fetch_page<E, R>(
  repo: &R,
  page: usize,
  page_size: usize,
  filters: &FilterSet<E::Field>,
) -> Result<ListPage<E>>
where
  E: Listable,
  R: Repository<E> + ?Sized,
{
  let page = page.max(1);
  let remote = repo.list_paged(page, page_size, filters).await?;
  let mut items = remote.items;
  items.truncate(page_size);

  Ok(ListPage {
    items,
    page,
    page_size,
    total: remote.total,
    total_pages: total_pages(remote.total, page_size),
  })
}

/// Finite, non-restartable walk over every backend page.
///
/// Requests page 1, 2, ... until page `ceil(total / page_size)` has been
/// returned. An empty or zero-total first page, or any empty page, ends the
/// walk. Once exhausted (or after an error) it keeps returning `None`.
pub struct PageCursor<'a, E: Listable, R: ?Sized> {
  repo: &'a R,
  filters: &'a FilterSet<E::Field>,
  page_size: usize,
  next: usize,
  done: bool,
}

impl<'a, E, R> PageCursor<'a, E, R>
where
  E: Listable,
  R: Repository<E> + ?Sized,
{
  pub fn new(repo: &'a R, filters: &'a FilterSet<E::Field>, page_size: usize) -> Self {
    Self {
      repo,
      filters,
      page_size: page_size.max(1),
      next: 1,
      done: false,
    }
  }

  #[cfg(test)]
  pub fn is_done(&self) -> bool {
    self.done
  }

  pub async fn next_page(&mut self) -> Result<Option<RemotePage<E>>> {
    if self.done {
      return Ok(None);
    }

    let page = self.next;
    let response = match self.repo.list_paged(page, self.page_size, self.filters).await {
      Ok(response) => response,
      Err(e) => {
        self.done = true;
        return Err(e);
      }
    };

    if response.items.is_empty() || response.total == 0 {
      debug!(page, total = response.total, "page walk ended on an empty page");
      self.done = true;
      return Ok(None);
    }

    let last = total_pages(response.total, self.page_size);
    if page >= last {
      self.done = true;
    } else {
      self.next += 1;
    }
    Ok(Some(response))
  }

  /// The remaining pages as a stream.
  pub fn into_stream(self) -> impl Stream<Item = Result<RemotePage<E>>> + 'a {
    stream::try_unfold(self, |mut cursor| async move {
      Ok(cursor.next_page().await?.map(|page| (page, cursor)))
    })
  }
}

/// Load the whole collection narrowed by `filters`.
///
/// Uses the repository's bulk endpoint when it has one, otherwise walks
/// every page with `page_size`.
pub async fn fetch_all<E, R>(
  repo: &R,
  filters: &FilterSet<E::Field>,
  page_size: usize,
) -> Result<Vec<E>>
where
  E: Listable,
  R: Repository<E> + ?Sized,
{
  if let Some(items) = repo.list_all(filters).await? {
    debug!(filters = %filters, count = items.len(), "collection loaded from bulk endpoint");
    return Ok(items);
  }

  let items = PageCursor::new(repo, filters, page_size)
    .into_stream()
    .try_fold(Vec::new(), |mut acc, page| async move {
      acc.extend(page.items);
      Ok(acc)
    })
    .await?;

  debug!(filters = %filters, count = items.len(), "collection loaded page by page");
  Ok(items)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listing::filter::{normalize, FilterValue};
  use crate::listing::testing::{item, FakeRepository, Item, ItemField};

  fn items(n: u64) -> Vec<Item> {
    (1..=n)
      .map(|id| item(id, "PENDIENTE", if id % 2 == 0 { "ropa" } else { "hogar" }, "Ana Pérez"))
      .collect()
  }

  #[tokio::test(start_paused = true)]
  async fn test_fetch_all_walks_every_page() {
    let repo = FakeRepository::new(items(25));
    let all = fetch_all(&repo, &FilterSet::new(), 10).await.unwrap();

    assert_eq!(all.len(), 25);
    let pages: Vec<usize> = repo.calls().iter().map(|c| c.page).collect();
    assert_eq!(pages, vec![1, 2, 3]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_fetch_all_exact_multiple_stops_on_last_page() {
    let repo = FakeRepository::new(items(20));
    let all = fetch_all(&repo, &FilterSet::new(), 10).await.unwrap();

    assert_eq!(all.len(), 20);
    assert_eq!(repo.calls().len(), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_fetch_all_passes_server_filters() {
    let repo = FakeRepository::new(items(25));
    let filters = normalize(vec![(ItemField::Category, FilterValue::text("ropa"))]);
    let all = fetch_all(&repo, &filters, 50).await.unwrap();

    assert_eq!(all.len(), 12);
    assert_eq!(repo.calls()[0].filters, "categoria=ropa");
  }

  #[tokio::test(start_paused = true)]
  async fn test_empty_first_page_terminates() {
    let repo = FakeRepository::<Item>::new(Vec::new());
    let all = fetch_all(&repo, &FilterSet::new(), 50).await.unwrap();

    assert!(all.is_empty());
    assert_eq!(repo.calls().len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_cursor_stays_exhausted() {
    let repo = FakeRepository::new(items(3));
    let filters = FilterSet::new();
    let mut cursor = PageCursor::new(&repo, &filters, 50);

    assert_eq!(cursor.next_page().await.unwrap().unwrap().items.len(), 3);
    assert!(cursor.is_done());
    assert!(cursor.next_page().await.unwrap().is_none());
    assert_eq!(repo.calls().len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_cursor_error_ends_walk() {
    let repo = FakeRepository::new(items(30));
    repo.set_failing(true);
    let filters = FilterSet::new();
    let mut cursor = PageCursor::new(&repo, &filters, 10);

    assert!(cursor.next_page().await.is_err());
    repo.set_failing(false);
    assert!(cursor.next_page().await.unwrap().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_bulk_endpoint_short_circuits() {
    let repo = FakeRepository::new(items(25)).with_bulk();
    let all = fetch_all(&repo, &FilterSet::new(), 10).await.unwrap();

    assert_eq!(all.len(), 25);
    assert_eq!(repo.bulk_calls(), 1);
    assert!(repo.calls().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_fetch_page_reports_totals() {
    let repo = FakeRepository::new(items(25));
    let page = fetch_page(&repo, 3, 10, &FilterSet::new()).await.unwrap();

    assert_eq!(page.items.len(), 5);
    assert_eq!(page.total, 25);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.page, 3);
  }
}
