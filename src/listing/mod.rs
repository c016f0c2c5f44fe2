//! Adaptive listing: filter, page and summarize a backend collection.
//!
//! Filters the backend evaluates natively are sent with a single-page
//! request (REMOTE). As soon as any filter the backend cannot evaluate is
//! active, the whole collection narrowed by the server-native subset is
//! fetched once, cached, and filtered and paged in memory (LOCAL).

mod cache;
mod capability;
mod engine;
mod filter;
mod pager;
mod stats;
mod traits;
mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use capability::{Capability, FieldKind, FilterField, Strategy};
pub use engine::{ListingEngine, ListingSettings};
pub use filter::{FilterSet, FilterValue, StockBand};
pub use stats::Stats;
pub use traits::{Listable, Mutation, RemotePage, Repository, StockLevel};

#[cfg(test)]
pub(crate) use cache::apply_filters;
#[cfg(test)]
pub(crate) use capability::decide;
#[cfg(test)]
pub(crate) use filter::{normalize, DateRange};
