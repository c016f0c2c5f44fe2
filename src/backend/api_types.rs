//! Wire types for the shop API.
//!
//! Entities are sent and received as-is; these are only the envelopes
//! around them.

use serde::{Deserialize, Serialize};

use crate::listing::RemotePage;

fn first_page() -> usize {
  1
}

/// `GET /{resource}` response body.
#[derive(Debug, Deserialize)]
pub struct ApiPage<T> {
  #[serde(default = "Vec::new")]
  pub items: Vec<T>,
  #[serde(default)]
  pub total: u64,
  #[serde(default = "first_page")]
  pub page: usize,
}

impl<T> ApiPage<T> {
  pub fn into_remote(self) -> RemotePage<T> {
    RemotePage {
      items: self.items,
      total: self.total,
      page: self.page,
    }
  }
}

/// `PATCH /{resource}/{id}/estado` request body.
#[derive(Debug, Serialize)]
pub struct ApiStatusChange<'a> {
  pub estado: &'a str,
}
