use ratatui::prelude::Color;

/// Truncate to at most `max_len` chars, ending in "..." when cut
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for an order or product status
pub fn status_color(status: &str) -> Color {
  match status {
    "ENTREGADO" | "activo" => Color::Green,
    "PAGADO" | "ENVIADO" => Color::Cyan,
    "PENDIENTE" => Color::Yellow,
    "CANCELADO" | "inactivo" => Color::Red,
    _ => Color::White,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hola", 10), "hola");
    assert_eq!(truncate("hola", 4), "hola");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hola mundo", 7), "hola...");
  }

  #[test]
  fn test_truncate_counts_chars() {
    assert_eq!(truncate("Muñeca de trapo", 9), "Muñeca...");
  }

  #[test]
  fn test_status_colors() {
    assert_eq!(status_color("ENTREGADO"), Color::Green);
    assert_eq!(status_color("PENDIENTE"), Color::Yellow);
    assert_eq!(status_color("CANCELADO"), Color::Red);
    assert_eq!(status_color("inactivo"), Color::Red);
    assert_eq!(status_color("desconocido"), Color::White);
  }
}
