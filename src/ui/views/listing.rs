use crate::listing::{FilterValue, ListingEngine, ListingSettings, Mutation, Repository};
use crate::shop::{AdminScreen, Tile};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{draw_footer, status_color, truncate, FooterInfo};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};
use std::sync::Arc;
use tracing::debug;

const CELL_WIDTH: usize = 32;

/// One admin screen: summary tiles, the current page and a footer.
pub struct ListingView<E: AdminScreen> {
  engine: ListingEngine<E>,
  table_state: TableState,
  search: SearchInput,
}

impl<E: AdminScreen> ListingView<E> {
  /// Mounting issues the initial page and statistics loads.
  pub fn new(repo: Arc<dyn Repository<E>>, settings: ListingSettings) -> Self {
    let mut engine = ListingEngine::new(repo, settings);
    engine.load();

    Self {
      engine,
      table_state: TableState::default(),
      search: SearchInput::new(),
    }
  }

  #[cfg(test)]
  pub(crate) fn engine(&self) -> &ListingEngine<E> {
    &self.engine
  }

  #[cfg(test)]
  pub(crate) async fn settle(&mut self) {
    self.engine.settle().await;
  }

  fn current_search(&self) -> String {
    match self.engine.filters().get(E::search_field()) {
      Some(FilterValue::Text(text)) => text.clone(),
      _ => String::new(),
    }
  }

  fn tiles(&self) -> Vec<Tile<E::Field>> {
    E::tiles(self.engine.current_stats())
  }

  fn is_tile_active(&self, tile: &Tile<E::Field>) -> bool {
    match &tile.toggle {
      Some((field, value)) => self.engine.filters().get(*field) == Some(value),
      None => false,
    }
  }

  fn selected(&self) -> Option<&E> {
    self
      .table_state
      .selected()
      .and_then(|i| self.engine.current_page().items.get(i))
  }

  fn toggle_tile(&mut self, index: usize) {
    let tiles = self.tiles();
    if let Some((field, value)) = tiles.into_iter().nth(index).and_then(|t| t.toggle) {
      self.engine.toggle_filter(field, value);
    }
  }

  fn delete_selected(&mut self) {
    if let Some(id) = self.selected().map(|e| e.id()) {
      self.engine.mutate(Mutation::Delete(id));
    }
  }

  fn advance_selected(&mut self) {
    let change = self
      .selected()
      .and_then(|e| e.next_status().map(|status| (e.id(), status)));
    match change {
      Some((id, status)) => self.engine.mutate(Mutation::ChangeStatus {
        id,
        status: status.to_string(),
      }),
      None => debug!("selected row has no next status"),
    }
  }

  fn render_tiles(&self, frame: &mut Frame, area: Rect) {
    let stats = self.engine.current_stats();
    let mut spans = Vec::new();

    for (i, tile) in self.tiles().iter().enumerate() {
      let hotkey = if i < 9 && tile.toggle.is_some() {
        format!("[{}] ", i + 1)
      } else {
        String::new()
      };
      let style = if self.is_tile_active(tile) {
        Style::default().fg(Color::Black).bg(Color::Yellow).bold()
      } else {
        Style::default().fg(status_color(&tile.label))
      };

      spans.push(Span::styled(hotkey, Style::default().fg(Color::Cyan)));
      spans.push(Span::styled(
        format!("{} {}", tile.label, stats.get(&tile.stat)),
        style,
      ));
      spans.push(Span::raw("   "));
    }

    let title = if self.engine.stats_loading() {
      " Summary (loading...) "
    } else {
      " Summary "
    };
    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(Line::from(spans))
      .block(block)
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let page = self.engine.current_page();
    let len = page.items.len();

    let title = if self.engine.is_loading() {
      format!(" {} (loading...) ", E::TITLE)
    } else {
      format!(" {} ({}) ", E::TITLE, page.total)
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = if self.engine.is_loading() {
        "Loading..."
      } else if self.engine.list_error().is_some() {
        "Failed to load. Press 'r' to retry."
      } else if self.engine.filters().is_empty() {
        "Nothing here yet."
      } else {
        "No results match the active filters. Press 'c' to clear them."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let header = Row::new(
      E::headers()
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Cyan).bold())),
    );

    let rows: Vec<Row> = page
      .items
      .iter()
      .map(|item| {
        let status = item.status();
        Row::new(item.cells().into_iter().map(|text| {
          let style = match status {
            Some(s) if s == text => Style::default().fg(status_color(s)),
            _ => Style::default(),
          };
          Cell::from(truncate(&text, CELL_WIDTH)).style(style)
        }))
      })
      .collect();

    let widths = vec![Constraint::Fill(1); E::headers().len()];
    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
      .highlight_symbol("> ");

    ensure_valid_selection(&mut self.table_state, len);
    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  fn footer_info(&self) -> FooterInfo<'_> {
    let page = self.engine.current_page();
    FooterInfo {
      page: page.page,
      total_pages: page.total_pages,
      total: page.total,
      strategy: self.engine.strategy(),
      active_filters: self.engine.filters().count_active(),
      loading: self.engine.is_loading(),
      list_error: self.engine.list_error().is_some(),
      stats_error: self.engine.stats_error().is_some(),
      notice: self.engine.notice(),
    }
  }
}

impl<E: AdminScreen> View for ListingView<E> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // Let search component try to handle first
    let current = self.current_search();
    match self.search.handle_key(key, &current) {
      KeyResult::Event(SearchEvent::Submitted(query)) => {
        self.engine.set_filter(E::search_field(), FilterValue::text(query));
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Cancelled) => {
        self.engine.set_filter(E::search_field(), None);
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('n') | KeyCode::Right => self.engine.next_page(),
      KeyCode::Char('p') | KeyCode::Left => self.engine.prev_page(),
      KeyCode::Char('c') => self.engine.clear_filters(),
      KeyCode::Char('r') => self.engine.refresh(),
      KeyCode::Char('x') => self.engine.dismiss_notice(),
      KeyCode::Char('d') => self.delete_selected(),
      KeyCode::Char('s') => self.advance_selected(),
      KeyCode::Char(c @ '1'..='9') => {
        let index = c as usize - '1' as usize;
        self.toggle_tile(index);
      }
      KeyCode::Char('q') => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let footer_height = if self.engine.notice().is_some() { 2 } else { 1 };
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(4),             // Tiles
        Constraint::Min(3),                // Table
        Constraint::Length(footer_height), // Footer
      ])
      .split(area);

    self.render_tiles(frame, chunks[0]);
    self.render_table(frame, chunks[1]);
    draw_footer(frame, chunks[2], &self.footer_info());

    self.search.render_overlay(frame, chunks[1]);
  }

  fn title(&self) -> &'static str {
    E::TITLE
  }

  fn tick(&mut self) {
    self.engine.poll();
  }

  fn refresh(&mut self) {
    self.engine.refresh();
  }

  fn is_capturing_input(&self) -> bool {
    self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("1-9", "filter").with_priority(30),
      ShortcutInfo::new("n/p", "page").with_priority(40),
      ShortcutInfo::new("c", "clear").with_priority(50),
      ShortcutInfo::new("r", "refresh").with_priority(60),
      ShortcutInfo::new("d", "delete").with_priority(70),
      ShortcutInfo::new("s", "status").with_priority(75),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listing::testing::FakeRepository;
  use crate::listing::Strategy;
  use crate::shop::orders::{Customer, Order, OrderField, OrderStatus};
  use chrono::{TimeZone, Utc};
  use crossterm::event::KeyModifiers;

  fn order(id: u64, estado: OrderStatus) -> Order {
    Order {
      id,
      numero_pedido: format!("PED-{:04}", id),
      cliente: Customer {
        nombre: if id % 2 == 0 { "Ana" } else { "Bruno" }.to_string(),
        apellido: "Pérez".to_string(),
        email: format!("cliente{}@tienda.test", id),
      },
      estado,
      metodo_pago: "TARJETA".to_string(),
      metodo_envio: "ESTANDAR".to_string(),
      total: 25.0,
      fecha: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    }
  }

  /// 25 orders, 7 pending
  fn view() -> (ListingView<Order>, Arc<FakeRepository<Order>>) {
    let orders = (1..=25)
      .map(|id| {
        let status = if id <= 7 {
          OrderStatus::Pendiente
        } else {
          OrderStatus::Pagado
        };
        order(id, status)
      })
      .collect();
    let repo = Arc::new(FakeRepository::new(orders));
    let view = ListingView::<Order>::new(repo.clone(), ListingSettings::default());
    (view, repo)
  }

  fn press(view: &mut ListingView<Order>, code: KeyCode) -> ViewAction {
    view.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
  }

  fn type_text(view: &mut ListingView<Order>, text: &str) {
    for c in text.chars() {
      press(view, KeyCode::Char(c));
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_tile_hotkey_toggles_status_filter() {
    let (mut view, _repo) = view();
    view.settle().await;

    // Tile 1 is the total, tile 2 is PENDIENTE
    press(&mut view, KeyCode::Char('2'));
    view.settle().await;
    assert_eq!(view.engine().strategy(), Strategy::Local);
    assert_eq!(view.engine().current_page().total, 7);

    press(&mut view, KeyCode::Char('2'));
    view.settle().await;
    assert_eq!(view.engine().strategy(), Strategy::Remote);
    assert_eq!(view.engine().current_page().total, 25);
  }

  #[tokio::test(start_paused = true)]
  async fn test_total_tile_has_no_filter() {
    let (mut view, repo) = view();
    view.settle().await;
    let calls = repo.calls().len();

    press(&mut view, KeyCode::Char('1'));
    view.settle().await;
    assert!(view.engine().filters().is_empty());
    assert_eq!(repo.calls().len(), calls);
  }

  #[tokio::test(start_paused = true)]
  async fn test_search_submit_and_cancel() {
    let (mut view, _repo) = view();
    view.settle().await;

    press(&mut view, KeyCode::Char('/'));
    assert!(view.is_capturing_input());
    type_text(&mut view, "ana");
    press(&mut view, KeyCode::Enter);
    view.settle().await;

    assert_eq!(
      view.engine().filters().get(OrderField::Search),
      Some(&FilterValue::text("ana"))
    );
    assert_eq!(view.engine().current_page().total, 12);

    press(&mut view, KeyCode::Char('/'));
    press(&mut view, KeyCode::Esc);
    view.settle().await;
    assert!(view.engine().filters().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_keys_typed_into_search_are_not_commands() {
    let (mut view, _repo) = view();
    view.settle().await;

    press(&mut view, KeyCode::Char('/'));
    assert_eq!(press(&mut view, KeyCode::Char('q')), ViewAction::None);
    press(&mut view, KeyCode::Char('2'));
    assert!(view.engine().filters().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_paging_keys() {
    let (mut view, _repo) = view();
    view.settle().await;

    press(&mut view, KeyCode::Char('n'));
    view.settle().await;
    assert_eq!(view.engine().current_page().page, 2);

    press(&mut view, KeyCode::Left);
    view.settle().await;
    assert_eq!(view.engine().current_page().page, 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_delete_selected_row() {
    let (mut view, repo) = view();
    view.settle().await;

    view.table_state.select(Some(0));
    press(&mut view, KeyCode::Char('d'));
    view.settle().await;

    assert_eq!(repo.len(), 24);
    assert_eq!(view.engine().current_page().total, 24);
    assert_eq!(view.engine().current_stats().total(), 24);
  }

  #[tokio::test(start_paused = true)]
  async fn test_advance_status_mutates() {
    let (mut view, repo) = view();
    view.settle().await;

    view.table_state.select(Some(0));
    press(&mut view, KeyCode::Char('s'));
    view.settle().await;
    assert_eq!(repo.mutation_count(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_quit_key() {
    let (mut view, _repo) = view();
    assert_eq!(press(&mut view, KeyCode::Char('q')), ViewAction::Quit);
  }
}
