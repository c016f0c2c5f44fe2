//! The adaptive listing engine.
//!
//! One engine backs one visible list. It owns the filter set, picks a
//! strategy for every filter change, keeps the collection cache for LOCAL
//! mode, and maintains statistics on a separate request lane so the two can
//! fail (and race) independently.

use color_eyre::{Report, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::cache::CollectionCache;
use super::capability::{decide, Strategy};
use super::filter::{FilterSet, FilterValue};
use super::pager;
use super::stats::Stats;
use super::traits::{Listable, Mutation, Repository};
use super::window::{clamp_page, ListPage};
use crate::query::Query;

/// Page sizes for display and for full-collection walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingSettings {
  pub page_size: usize,
  pub fetch_page_size: usize,
}

impl Default for ListingSettings {
  fn default() -> Self {
    Self {
      page_size: 10,
      fetch_page_size: 50,
    }
  }
}

/// User-visible fetch failures. Each one is shown as a dismissible notice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
  #[error("Failed to load list: {0}")]
  List(String),
  #[error("Failed to load statistics: {0}")]
  Statistics(String),
  #[error("Failed to {action}: {message}")]
  Mutation {
    action: &'static str,
    message: String,
  },
}

enum ListReply<E: Listable> {
  Remote(ListPage<E>),
  Collection {
    items: Vec<E>,
    fingerprint: FilterSet<E::Field>,
    generation: u64,
  },
}

struct MutationOutcome<E> {
  action: &'static str,
  result: Result<Option<E>>,
}

pub struct ListingEngine<E: Listable> {
  repo: Arc<dyn Repository<E>>,
  settings: ListingSettings,

  filters: FilterSet<E::Field>,
  /// Requested page; equals `current.page` once a reply lands
  page: usize,
  current: ListPage<E>,
  loaded: bool,

  cache: Option<CollectionCache<E>>,
  /// Fingerprint of the collection fetch in flight on the list lane
  pending_fingerprint: Option<FilterSet<E::Field>>,
  /// Bumped on every invalidation; collection replies from an older
  /// generation are shown but not cached
  generation: u64,

  stats: Stats,

  list: Query<ListReply<E>>,
  stats_lane: Query<Vec<E>>,
  mutation_tx: mpsc::UnboundedSender<MutationOutcome<E>>,
  mutation_rx: mpsc::UnboundedReceiver<MutationOutcome<E>>,
  mutations_in_flight: usize,

  list_error: Option<FetchFailure>,
  stats_error: Option<FetchFailure>,
  notice: Option<String>,
}

impl<E: Listable> ListingEngine<E> {
  pub fn new(repo: Arc<dyn Repository<E>>, settings: ListingSettings) -> Self {
    let settings = ListingSettings {
      page_size: settings.page_size.max(1),
      fetch_page_size: settings.fetch_page_size.max(1),
    };
    let (mutation_tx, mutation_rx) = mpsc::unbounded_channel();

    Self {
      repo,
      settings,
      filters: FilterSet::new(),
      page: 1,
      current: ListPage::empty(settings.page_size),
      loaded: false,
      cache: None,
      pending_fingerprint: None,
      generation: 0,
      stats: Stats::new(),
      list: Query::new("list"),
      stats_lane: Query::new("stats"),
      mutation_tx,
      mutation_rx,
      mutations_in_flight: 0,
      list_error: None,
      stats_error: None,
      notice: None,
    }
  }

  /// Initial load on mount: first page and statistics.
  pub fn load(&mut self) {
    self.reload_list();
    self.reload_stats();
  }

  // -- Accessors for rendering ---------------------------------------------

  pub fn current_page(&self) -> &ListPage<E> {
    &self.current
  }

  pub fn current_stats(&self) -> &Stats {
    &self.stats
  }

  pub fn filters(&self) -> &FilterSet<E::Field> {
    &self.filters
  }

  /// Derived from the filters on every call.
  pub fn strategy(&self) -> Strategy {
    decide(&self.filters)
  }

  pub fn is_loading(&self) -> bool {
    self.list.is_pending()
  }

  pub fn stats_loading(&self) -> bool {
    self.stats_lane.is_pending()
  }

  pub fn list_error(&self) -> Option<&FetchFailure> {
    self.list_error.as_ref()
  }

  pub fn stats_error(&self) -> Option<&FetchFailure> {
    self.stats_error.as_ref()
  }

  pub fn notice(&self) -> Option<&str> {
    self.notice.as_deref()
  }

  pub fn dismiss_notice(&mut self) {
    self.notice = None;
  }

  #[cfg(test)]
  pub fn cache(&self) -> Option<&CollectionCache<E>> {
    self.cache.as_ref()
  }

  /// List replies dropped as stale so far.
  #[cfg(test)]
  pub fn discarded(&self) -> u64 {
    self.list.discarded()
  }

  // -- Filter and page input -----------------------------------------------

  pub fn set_filter(&mut self, field: E::Field, value: impl Into<Option<FilterValue>>) {
    let mut next = self.filters.clone();
    next.set(field, value);
    self.change_filters(next);
  }

  pub fn toggle_filter(&mut self, field: E::Field, value: FilterValue) {
    let mut next = self.filters.clone();
    next.toggle(field, value);
    self.change_filters(next);
  }

  pub fn clear_filters(&mut self) {
    self.change_filters(FilterSet::new());
  }

  /// While a list request is in flight the page count is unknown, so the
  /// reply clamps instead.
  pub fn go_to_page(&mut self, page: usize) {
    let target = if self.list.is_pending() {
      page.max(1)
    } else {
      clamp_page(page, self.current.total_pages)
    };
    let settled_here = self.list_error.is_none() && (self.loaded || self.list.is_pending());
    if target == self.page && settled_here {
      return;
    }
    self.page = target;
    self.reload_list();
  }

  pub fn next_page(&mut self) {
    self.go_to_page(self.page + 1);
  }

  pub fn prev_page(&mut self) {
    self.go_to_page(self.page.saturating_sub(1));
  }

  /// Drop the cache and reload both the list and the statistics.
  pub fn refresh(&mut self) {
    info!(filters = %self.filters, "refresh requested");
    self.invalidate();
    self.reload_list();
    self.reload_stats();
  }

  /// Run a write operation. The cache is invalid from this call on.
  pub fn mutate(&mut self, mutation: Mutation<E>) {
    self.invalidate();

    let action = mutation.label();
    let repo = Arc::clone(&self.repo);
    let tx = self.mutation_tx.clone();
    self.mutations_in_flight += 1;

    tokio::spawn(async move {
      let result = repo.mutate(mutation).await;
      let _ = tx.send(MutationOutcome { action, result });
    });
    debug!(action, "mutation issued");
  }

  /// Recompute statistics, reusing an unfiltered cached collection if present.
  pub fn reload_stats(&mut self) {
    if let Some(cache) = self.cache.as_ref().filter(|c| c.fingerprint().is_empty()) {
      self.stats = E::summarize(cache.items());
      self.stats_error = None;
      self.stats_lane.supersede();
      debug!(count = cache.items().len(), "statistics computed from cached collection");
      return;
    }

    let repo = Arc::clone(&self.repo);
    let page_size = self.settings.fetch_page_size;
    self.stats_lane.issue(async move {
      pager::fetch_all(repo.as_ref(), &FilterSet::new(), page_size).await
    });
  }

  // -- Reply handling ------------------------------------------------------

  /// Apply whatever replies have arrived. Returns whether anything changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;
    while let Ok(outcome) = self.mutation_rx.try_recv() {
      self.apply_mutation(outcome);
      changed = true;
    }
    if let Some(result) = self.list.poll() {
      self.apply_list(result);
      changed = true;
    }
    if let Some(result) = self.stats_lane.poll() {
      self.apply_stats(result);
      changed = true;
    }
    changed
  }

  /// Wait until no mutation, list or statistics request is in flight.
  pub async fn settle(&mut self) {
    loop {
      if self.mutations_in_flight > 0 {
        match self.mutation_rx.recv().await {
          Some(outcome) => self.apply_mutation(outcome),
          None => break,
        }
      } else if self.list.is_pending() {
        if let Some(result) = self.list.settled().await {
          self.apply_list(result);
        }
      } else if self.stats_lane.is_pending() {
        if let Some(result) = self.stats_lane.settled().await {
          self.apply_stats(result);
        }
      } else {
        break;
      }
    }
  }

  // -- Internals -----------------------------------------------------------

  fn change_filters(&mut self, next: FilterSet<E::Field>) {
    if next == self.filters {
      debug!(filters = %next, "filter change is a no-op");
      return;
    }
    self.filters = next;
    self.page = 1;
    info!(strategy = %self.strategy(), filters = %self.filters, "filters changed");
    self.reload_list();
  }

  /// The single transition every reload goes through.
  fn reload_list(&mut self) {
    match self.strategy() {
      Strategy::Remote => self.request_remote_page(),
      Strategy::Local => {
        let served = self
          .cache
          .as_ref()
          .map_or(false, |cache| cache.serves(&self.filters));
        let fingerprint = self.filters.server_fingerprint();
        if served {
          self.list.supersede();
          self.pending_fingerprint = None;
          self.render_cached();
        } else if self.list.is_pending() && self.pending_fingerprint.as_ref() == Some(&fingerprint) {
          // The reply in flight is sliced at `self.page` when it lands
          debug!(page = self.page, fingerprint = %fingerprint, "collection already in flight");
        } else {
          self.request_collection();
        }
      }
    }
  }

  fn request_remote_page(&mut self) {
    let repo = Arc::clone(&self.repo);
    let filters = self.filters.server_fingerprint();
    let page = self.page;
    let page_size = self.settings.page_size;
    self.pending_fingerprint = None;

    let token = self.list.issue(async move {
      pager::fetch_page(repo.as_ref(), page, page_size, &filters)
        .await
        .map(ListReply::Remote)
    });
    debug!(token = %token, page, "remote page requested");
  }

  fn request_collection(&mut self) {
    let repo = Arc::clone(&self.repo);
    let fingerprint = self.filters.server_fingerprint();
    let generation = self.generation;
    let page_size = self.settings.fetch_page_size;
    debug!(fingerprint = %fingerprint, "collection fetch requested");
    self.pending_fingerprint = Some(fingerprint.clone());

    self.list.issue(async move {
      let items = pager::fetch_all(repo.as_ref(), &fingerprint, page_size).await?;
      Ok(ListReply::Collection {
        items,
        fingerprint,
        generation,
      })
    });
  }

  fn render_cached(&mut self) {
    if let Some(cache) = &self.cache {
      debug!(page = self.page, fetched_at = %cache.fetched_at(), "page served from cache");
      let page = cache.page(&self.filters, self.page, self.settings.page_size);
      self.commit_page(page);
    }
  }

  fn commit_page(&mut self, page: ListPage<E>) {
    if page.page != self.page {
      debug!(from = self.page, to = page.page, "page clamped");
    }
    self.page = page.page;
    self.current = page;
    self.loaded = true;
    self.list_error = None;
  }

  fn invalidate(&mut self) {
    if self.cache.take().is_some() {
      debug!("collection cache invalidated");
    }
    self.generation += 1;
    // A fetch in flight may predate the write; the next reload reissues it
    self.pending_fingerprint = None;
  }

  fn apply_list(&mut self, result: Result<ListReply<E>>) {
    self.pending_fingerprint = None;
    match result {
      Ok(ListReply::Remote(page)) => {
        let clamped = clamp_page(page.page, page.total_pages);
        if clamped != page.page {
          debug!(from = page.page, to = clamped, "remote page past the end, re-requesting");
          self.page = clamped;
          self.request_remote_page();
          return;
        }
        self.commit_page(page);
      }
      Ok(ListReply::Collection {
        items,
        fingerprint,
        generation,
      }) => {
        let cache = CollectionCache::new(items, fingerprint);
        let page = cache.page(&self.filters, self.page, self.settings.page_size);
        if generation == self.generation {
          self.cache = Some(cache);
        } else {
          debug!("collection outlived an invalidation, not caching it");
        }
        self.commit_page(page);
      }
      Err(e) => self.fail_list(e),
    }
  }

  fn fail_list(&mut self, error: Report) {
    let failure = FetchFailure::List(format!("{:#}", error));
    warn!(error = %failure, "list fetch failed");

    if self.loaded {
      self.page = self.current.page;
    } else {
      self.current = ListPage::empty(self.settings.page_size);
    }
    self.notice = Some(failure.to_string());
    self.list_error = Some(failure);
  }

  fn apply_stats(&mut self, result: Result<Vec<E>>) {
    match result {
      Ok(items) => {
        self.stats = E::summarize(&items);
        self.stats_error = None;
      }
      Err(e) => {
        let failure = FetchFailure::Statistics(format!("{:#}", e));
        warn!(error = %failure, "statistics fetch failed");
        self.notice = Some(failure.to_string());
        self.stats_error = Some(failure);
      }
    }
  }

  fn apply_mutation(&mut self, outcome: MutationOutcome<E>) {
    self.mutations_in_flight = self.mutations_in_flight.saturating_sub(1);
    match outcome.result {
      Ok(_) => {
        info!(action = outcome.action, "mutation succeeded");
        self.invalidate();
        self.reload_list();
        self.reload_stats();
      }
      Err(e) => {
        let failure = FetchFailure::Mutation {
          action: outcome.action,
          message: format!("{:#}", e),
        };
        warn!(error = %failure, "mutation failed");
        self.notice = Some(failure.to_string());
      }
    }
  }
}
