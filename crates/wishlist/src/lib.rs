//! Per-customer wishlist of catalog products.

pub mod service;
pub mod store;

pub use service::{WishlistChange, WishlistError, WishlistService};
pub use store::{InMemoryWishlistStore, WishlistStore};
