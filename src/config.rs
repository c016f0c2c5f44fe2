use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::listing::ListingSettings;
use crate::shop::Screen;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub backend: BackendConfig,
  /// Custom title for header (defaults to the backend host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub default_screen: Screen,
  #[serde(default)]
  pub listing: ListingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  pub url: String,
  /// Per-request HTTP timeout
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
  30
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
  #[serde(default = "default_page_size")]
  pub page_size: usize,
  /// Page size used when loading a whole collection
  #[serde(default = "default_fetch_page_size")]
  pub fetch_page_size: usize,
}

fn default_page_size() -> usize {
  10
}

fn default_fetch_page_size() -> usize {
  50
}

impl Default for ListingConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
      fetch_page_size: default_fetch_page_size(),
    }
  }
}

impl ListingConfig {
  pub fn settings(&self) -> ListingSettings {
    ListingSettings {
      page_size: self.page_size,
      fetch_page_size: self.fetch_page_size,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./shopdesk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/shopdesk/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/shopdesk/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("shopdesk.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("shopdesk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Failed to parse config: {}", e))?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    if self.backend.url.trim().is_empty() {
      return Err(eyre!("backend.url must not be empty"));
    }
    if self.listing.page_size == 0 {
      return Err(eyre!("listing.page_size must be greater than 0"));
    }
    if self.listing.fetch_page_size == 0 {
      return Err(eyre!("listing.fetch_page_size must be greater than 0"));
    }
    Ok(())
  }

  /// Header title: configured title, else the backend host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    url::Url::parse(&self.backend.url)
      .ok()
      .and_then(|u| u.host_str().map(str::to_string))
      .unwrap_or_else(|| self.backend.url.clone())
  }

  /// Get the backend API token from the environment, if any.
  ///
  /// Reads SHOPDESK_API_TOKEN.
  pub fn get_api_token() -> Option<String> {
    std::env::var("SHOPDESK_API_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty())
  }
}
