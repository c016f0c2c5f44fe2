//! REST access to the shop backend.

pub mod api_types;
mod client;

pub use client::{HttpRepository, ShopClient};
