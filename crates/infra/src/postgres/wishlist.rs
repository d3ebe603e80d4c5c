use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use shopfront_core::{ProductId, StoreError, UserId};
use shopfront_wishlist::WishlistStore;

use super::{decode_error, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct PostgresWishlistStore {
    pool: PgPool,
}

impl PostgresWishlistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn product_param(product_id: ProductId) -> Result<i32, StoreError> {
    i32::try_from(product_id.get()).map_err(|_| StoreError::Invalid(format!("product id {product_id} out of range")))
}

#[async_trait]
impl WishlistStore for PostgresWishlistStore {
    #[instrument(skip(self), err)]
    async fn items(&self, owner_id: UserId) -> Result<Vec<ProductId>, StoreError> {
        let rows = sqlx::query("SELECT product_id FROM wishlist_items WHERE owner_id = $1 ORDER BY position ASC")
            .bind(*owner_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_wishlist", e))?;

        rows.iter()
            .map(|row| {
                let raw: i32 = row.try_get("product_id").map_err(|e| decode_error("list_wishlist", e))?;
                u32::try_from(raw)
                    .map(ProductId::new)
                    .map_err(|e| decode_error("list_wishlist", e))
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn add(&self, owner_id: UserId, product_id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO wishlist_items (owner_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (owner_id, product_id) DO NOTHING
            "#,
        )
        .bind(*owner_id.as_uuid())
        .bind(product_param(product_id)?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_wishlist_item", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), err)]
    async fn remove(&self, owner_id: UserId, product_id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM wishlist_items WHERE owner_id = $1 AND product_id = $2")
            .bind(*owner_id.as_uuid())
            .bind(product_param(product_id)?)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_wishlist_item", e))?;
        Ok(result.rows_affected() > 0)
    }
}
