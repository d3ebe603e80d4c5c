//! Public contact form and the admin inbox that reads it.

pub mod service;
pub mod store;
pub mod submission;

pub use service::{ContactError, ContactForm, ContactService};
pub use store::{ContactStore, InMemoryContactStore};
pub use submission::{ContactSubmission, DEFAULT_SUBJECT};
