//! Postgres-backed store adapters.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate email |
//! | Database (foreign key violation) | `23503` | `Invalid` | Item for a missing order |
//! | Database (check constraint violation) | `23514` | `Invalid` | Zero total, zero quantity |
//! | Database (other) | Any other | `Unavailable` | |
//! | PoolClosed / Io / other | N/A | `Unavailable` | Connection failures |

mod contact;
mod orders;
mod users;
mod wishlist;

pub use contact::PostgresContactStore;
pub use orders::PostgresOrderStore;
pub use users::PostgresUserStore;
pub use wishlist::PostgresWishlistStore;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, instrument};

use shopfront_core::StoreError;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Open a pool against `database_url`.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Apply the schema. Safe to run on every start.
#[instrument(skip(pool))]
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", e))?;
    info!("database schema ready");
    Ok(())
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") | Some("23514") => StoreError::Invalid(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::unavailable(format!("connection pool closed in {}", operation)),
        other => StoreError::unavailable(format!("{} failed: {}", operation, other)),
    }
}

/// Decode failures inside a row are storage corruption, not caller error.
pub(crate) fn decode_error(operation: &str, err: impl core::fmt::Display) -> StoreError {
    StoreError::unavailable(format!("failed to decode row in {}: {}", operation, err))
}

pub(crate) fn to_db_amount(operation: &str, amount: u64) -> Result<i64, StoreError> {
    i64::try_from(amount).map_err(|_| StoreError::Invalid(format!("amount out of range in {}", operation)))
}

pub(crate) fn from_db_amount(operation: &str, amount: i64) -> Result<u64, StoreError> {
    u64::try_from(amount).map_err(|e| decode_error(operation, e))
}
