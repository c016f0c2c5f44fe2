mod app;
mod backend;
mod commands;
mod config;
mod event;
mod listing;
mod query;
mod shop;
mod ui;

use clap::Parser;
use color_eyre::{eyre::WrapErr, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "shopdesk")]
#[command(about = "A terminal admin console for an e-commerce backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./shopdesk.yaml, then $XDG_CONFIG_HOME/shopdesk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Screen to open on start
  #[arg(short, long, value_enum)]
  screen: Option<shop::Screen>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Keep the guard alive so buffered log lines are flushed on exit
  let _guard = init_logging()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let screen = args.screen.unwrap_or(config.default_screen);

  tracing::info!(backend = %config.backend.url, %screen, "starting shopdesk");

  // Initialize and run the app
  let mut app = app::App::new(config, screen)?;
  app.run().await?;

  Ok(())
}

/// Log to `<data dir>/shopdesk/shopdesk.log`; the terminal belongs to the UI.
fn init_logging() -> Result<WorkerGuard> {
  let dir = dirs::data_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("shopdesk");
  std::fs::create_dir_all(&dir)
    .wrap_err_with(|| format!("Failed to create log directory {}", dir.display()))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
    &dir,
    "shopdesk.log",
  ));

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_env("SHOPDESK_LOG").unwrap_or_else(|_| "shopdesk=info".into()))
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .init();

  Ok(guard)
}
