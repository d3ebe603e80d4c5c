//! Product catalog (read-only, seeded at startup).

pub mod product;

pub use product::{Catalog, Product};
