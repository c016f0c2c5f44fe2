//! Page window arithmetic.

/// The visible slice of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
  pub items: Vec<T>,
  /// 1-based, always within `1..=total_pages`
  pub page: usize,
  pub page_size: usize,
  /// Items matching the active filters across all pages
  pub total: u64,
  /// At least 1, even for an empty listing
  pub total_pages: usize,
}

impl<T> ListPage<T> {
  pub fn empty(page_size: usize) -> Self {
    Self {
      items: Vec::new(),
      page: 1,
      page_size,
      total: 0,
      total_pages: 1,
    }
  }
}

/// `max(1, ceil(total / page_size))`
pub fn total_pages(total: u64, page_size: usize) -> usize {
  let page_size = page_size.max(1) as u64;
  (total.div_ceil(page_size) as usize).max(1)
}

/// Clamp a requested page into `1..=total_pages`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
  page.max(1).min(total_pages.max(1))
}

/// Cut one page out of an already filtered and sorted list.
///
/// Returns the visible items, the clamped page and the page count.
pub fn slice<T: Clone>(items: &[T], page: usize, page_size: usize) -> (Vec<T>, usize, usize) {
  let page_size = page_size.max(1);
  let pages = total_pages(items.len() as u64, page_size);
  let page = clamp_page(page, pages);
  let start = (page - 1) * page_size;
  let end = (start + page_size).min(items.len());
  let visible = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
  (visible, page, pages)
}

/// Build a [`ListPage`] from a full in-memory list.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> ListPage<T> {
  let (visible, page, total_pages) = slice(items, page, page_size);
  ListPage {
    items: visible,
    page,
    page_size: page_size.max(1),
    total: items.len() as u64,
    total_pages,
  }
}
