mod listing;

pub use listing::ListingView;
