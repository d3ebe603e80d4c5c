use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use shopfront_core::{ProductId, StoreError, UserId};

/// Persistence port for wishlists: an ordered, duplicate-free list of product
/// ids per owner.
#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// Product ids in the order they were added.
    async fn items(&self, owner_id: UserId) -> Result<Vec<ProductId>, StoreError>;

    /// Returns `false` when the product was already present.
    async fn add(&self, owner_id: UserId, product_id: ProductId) -> Result<bool, StoreError>;

    /// Returns `false` when the product was not present.
    async fn remove(&self, owner_id: UserId, product_id: ProductId) -> Result<bool, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryWishlistStore {
    inner: RwLock<HashMap<UserId, Vec<ProductId>>>,
}

impl InMemoryWishlistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::unavailable("wishlist store lock poisoned")
}

#[async_trait]
impl WishlistStore for InMemoryWishlistStore {
    async fn items(&self, owner_id: UserId) -> Result<Vec<ProductId>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&owner_id).cloned().unwrap_or_default())
    }

    async fn add(&self, owner_id: UserId, product_id: ProductId) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let items = map.entry(owner_id).or_default();
        if items.contains(&product_id) {
            return Ok(false);
        }
        items.push(product_id);
        Ok(true)
    }

    async fn remove(&self, owner_id: UserId, product_id: ProductId) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let Some(items) = map.get_mut(&owner_id) else {
            return Ok(false);
        };
        let before = items.len();
        items.retain(|id| *id != product_id);
        Ok(items.len() != before)
    }
}
