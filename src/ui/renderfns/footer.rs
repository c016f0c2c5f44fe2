use crate::listing::Strategy;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// What the footer shows about the list under it
#[derive(Debug, Clone, Default)]
pub struct FooterInfo<'a> {
  pub page: usize,
  pub total_pages: usize,
  pub total: u64,
  pub strategy: Strategy,
  pub active_filters: usize,
  pub loading: bool,
  pub list_error: bool,
  pub stats_error: bool,
  pub notice: Option<&'a str>,
}

/// Draw the footer: paging on one line, the notice (if any) on the next
pub fn draw_footer(frame: &mut Frame, area: Rect, info: &FooterInfo) {
  let mut lines = vec![Line::from(status_spans(info))];
  if let Some(notice) = info.notice {
    lines.push(Line::from(vec![
      Span::styled(" ! ", Style::default().fg(Color::Black).bg(Color::Red)),
      Span::styled(format!(" {} ", notice), Style::default().fg(Color::Red)),
      Span::styled("<x> dismiss", Style::default().fg(Color::DarkGray)),
    ]));
  }

  let paragraph = Paragraph::new(lines).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

fn status_spans(info: &FooterInfo) -> Vec<Span<'static>> {
  let dim = Style::default().fg(Color::DarkGray);
  let mut spans = vec![
    Span::styled(
      format!(" page {}/{} ", info.page, info.total_pages),
      Style::default().fg(Color::Cyan).bold(),
    ),
    Span::styled("│", dim),
    Span::styled(format!(" {} total ", info.total), Style::default().fg(Color::White)),
    Span::styled("│", dim),
    Span::styled(
      format!(" {} ", info.strategy),
      Style::default().fg(match info.strategy {
        Strategy::Remote => Color::Blue,
        Strategy::Local => Color::Magenta,
      }),
    ),
  ];

  if info.active_filters > 0 {
    spans.push(Span::styled("│", dim));
    spans.push(Span::styled(
      format!(" {} filters ", info.active_filters),
      Style::default().fg(Color::Yellow),
    ));
  }
  if info.loading {
    spans.push(Span::styled(" loading... ", Style::default().fg(Color::Yellow)));
  }
  if info.list_error {
    spans.push(Span::styled(" [list error] ", Style::default().fg(Color::Red)));
  }
  if info.stats_error {
    spans.push(Span::styled(" [stats error] ", Style::default().fg(Color::Red)));
  }
  spans
}
