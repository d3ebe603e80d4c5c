//! Infrastructure layer: configuration, Postgres adapters, background workers.

pub mod config;
pub mod notifications;
pub mod postgres;


pub use config::{AppConfig, ConfigError};
pub use notifications::{Notification, NotificationCenter, NotificationKind, NotificationWorker, WorkerHandle};
