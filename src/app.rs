use crate::backend::{HttpRepository, ShopClient};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::shop::{AdminScreen, Order, Product, Screen, User};
use crate::ui;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::ListingView;
use crate::ui::{CommandEvent, CommandInput, KeyResult};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Main application state
pub struct App {
  config: Config,

  /// Shared by every screen's repository
  client: ShopClient,

  /// Screen currently mounted
  screen: Screen,
  view: Box<dyn View>,

  /// `:` prompt, owned here so it works on every screen
  command: CommandInput,

  /// Header title
  title: String,

  should_quit: bool,
}

impl App {
  /// Needs a running tokio runtime: mounting a screen starts its first loads.
  pub fn new(config: Config, screen: Screen) -> Result<Self> {
    let client = ShopClient::new(&config)?;
    let view = build_view(&client, &config, screen);
    let title = config.display_title();

    Ok(Self {
      config,
      client,
      screen,
      view,
      command: CommandInput::new(),
      title,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(TICK_RATE);
    let result = self.event_loop(&mut terminal, &mut events).await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.view.tick(),
      // Next draw picks up the new size
      Event::Resize(..) => {}
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let wants_command =
      self.command.is_active() || (key.code == KeyCode::Char(':') && !self.view.is_capturing_input());
    if wants_command {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(name)) => self.execute_command(&name),
        _ => {}
      }
      return;
    }

    match self.view.handle_key(key) {
      ViewAction::Quit => self.should_quit = true,
      ViewAction::None => {}
    }
  }

  fn execute_command(&mut self, name: &str) {
    if let Some(screen) = Screen::from_command(name) {
      self.mount(screen);
      return;
    }

    match name {
      "refresh" => self.view.refresh(),
      "quit" => self.should_quit = true,
      other => warn!(command = other, "unknown command"),
    }
  }

  /// Replace the current screen; replies still in flight for the old one go nowhere.
  fn mount(&mut self, screen: Screen) {
    info!(from = %self.screen, to = %screen, "switching screen");
    self.screen = screen;
    self.view = build_view(&self.client, &self.config, screen);
  }

  // Accessors for UI rendering
  pub fn view(&self) -> &dyn View {
    self.view.as_ref()
  }

  pub fn view_mut(&mut self) -> &mut dyn View {
    self.view.as_mut()
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  pub fn title(&self) -> &str {
    &self.title
  }
}

fn build_view(client: &ShopClient, config: &Config, screen: Screen) -> Box<dyn View> {
  match screen {
    Screen::Orders => listing_view::<Order>(client, config),
    Screen::Products => listing_view::<Product>(client, config),
    Screen::Users => listing_view::<User>(client, config),
  }
}

fn listing_view<E: AdminScreen>(client: &ShopClient, config: &Config) -> Box<dyn View> {
  let repo = Arc::new(HttpRepository::<E>::new(client.clone(), E::RESOURCE));
  Box::new(ListingView::<E>::new(repo, config.listing.settings()))
}
