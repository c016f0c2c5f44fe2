/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "orders",
    aliases: &["o", "pedidos"],
    description: "Browse and fulfil orders",
  },
  Command {
    name: "products",
    aliases: &["p", "productos"],
    description: "Manage the product catalog",
  },
  Command {
    name: "users",
    aliases: &["u", "usuarios"],
    description: "Browse customer and staff accounts",
  },
  Command {
    name: "refresh",
    aliases: &["r"],
    description: "Reload the current list and statistics",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit shopdesk",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd, &input_lower).map(|priority| (cmd, priority)))
    .collect();

  // Stable, so equal ranks keep declaration order
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better; `None` means no match.
fn rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

/// Resolve typed input to a command name, exactly or via alias.
pub fn resolve(input: &str) -> Option<&'static str> {
  let input = input.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == input || cmd.aliases.contains(&input.as_str()))
    .map(|cmd| cmd.name)
}
