mod components;
pub mod renderfns;
pub mod view;
pub mod views;

pub use components::{CommandEvent, CommandInput, KeyResult};

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::TableState;
use renderfns::draw_header;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Current view
    ])
    .split(frame.area());

  let shortcuts = app.view().shortcuts();
  let screen = app.view().title();
  draw_header(frame, chunks[0], app.title(), screen, &shortcuts);

  app.view_mut().render(frame, chunks[1]);
  app.command().render_overlay(frame, chunks[1]);
}

/// Keep a table selection inside `0..len`, selecting the first row when unset
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(i) if i >= len => state.select(Some(len - 1)),
    None => state.select(Some(0)),
    _ => {}
  }
}
