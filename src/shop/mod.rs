//! The admin screens: orders, products and users.

pub mod orders;
pub mod products;
pub mod users;

pub use orders::Order;
pub use products::Product;
pub use users::User;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

use crate::listing::{FilterField, FilterValue, Listable, Stats};

/// Screens reachable from the command prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
  #[default]
  Orders,
  Products,
  Users,
}

impl Screen {
  pub fn from_command(name: &str) -> Option<Self> {
    match name {
      "orders" => Some(Screen::Orders),
      "products" => Some(Screen::Products),
      "users" => Some(Screen::Users),
      _ => None,
    }
  }
}

impl fmt::Display for Screen {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let title = match self {
      Screen::Orders => Order::TITLE,
      Screen::Products => Product::TITLE,
      Screen::Users => User::TITLE,
    };
    f.write_str(title)
  }
}

/// A summary tile: one statistics key, optionally bound to a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile<F> {
  pub label: String,
  pub stat: String,
  pub toggle: Option<(F, FilterValue)>,
}

impl<F> Tile<F> {
  pub fn new(label: impl Into<String>, stat: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      stat: stat.into(),
      toggle: None,
    }
  }

  pub fn toggles(mut self, field: F, value: FilterValue) -> Self {
    self.toggle = Some((field, value));
    self
  }
}

/// One tile per `prefix.<value>` key present in `stats`, toggling `field`.
pub fn tiles_for_prefix<F: FilterField>(stats: &Stats, prefix: &str, field: F) -> Vec<Tile<F>> {
  let prefix = format!("{}.", prefix);
  stats
    .iter()
    .filter_map(|(key, _)| key.strip_prefix(&prefix).map(|value| (key, value)))
    .map(|(key, value)| Tile::new(value, key).toggles(field, FilterValue::text(value)))
    .collect()
}

/// An entity with its own admin screen.
pub trait AdminScreen: Listable + Serialize + DeserializeOwned {
  const TITLE: &'static str;
  /// REST resource under the backend base url
  const RESOURCE: &'static str;

  /// Field the `/` prompt writes to
  fn search_field() -> Self::Field;

  fn tiles(stats: &Stats) -> Vec<Tile<Self::Field>>;

  fn headers() -> &'static [&'static str];

  fn cells(&self) -> Vec<String>;

  /// Colored status cell, if the entity has one
  fn status(&self) -> Option<&str> {
    None
  }

  /// Status the `s` key moves this entity to
  fn next_status(&self) -> Option<&'static str> {
    None
  }
}
