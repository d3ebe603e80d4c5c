//! `shopfront-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod store;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, require_non_blank};
pub use id::{NotificationId, OrderId, ProductId, SubmissionId, UserId};
pub use store::StoreError;
