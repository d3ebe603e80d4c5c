use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use shopfront_auth::Identity;
use shopfront_catalog::{Catalog, Product};
use shopfront_core::{ProductId, StoreError};

use crate::WishlistStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WishlistError {
    #[error("product not found")]
    ProductNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of an add/remove together with the resulting wishlist.
#[derive(Debug, Clone, PartialEq)]
pub struct WishlistChange {
    /// Whether the wishlist actually changed.
    pub changed: bool,
    pub products: Vec<Product>,
}

/// Owner-scoped wishlist operations; product ids are resolved against the catalog.
pub struct WishlistService {
    store: Arc<dyn WishlistStore>,
    catalog: Arc<Catalog>,
}

impl WishlistService {
    pub fn new(store: Arc<dyn WishlistStore>, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    pub async fn get(&self, identity: &Identity) -> Result<Vec<Product>, WishlistError> {
        let ids = self.store.items(identity.subject_id).await?;
        // Products dropped from the catalog simply disappear from the view.
        Ok(ids.into_iter().filter_map(|id| self.catalog.get(id).ok()).collect())
    }

    #[instrument(skip(self, identity), fields(owner_id = %identity.subject_id))]
    pub async fn add(&self, identity: &Identity, product_id: ProductId) -> Result<WishlistChange, WishlistError> {
        if !self.catalog.contains(product_id) {
            return Err(WishlistError::ProductNotFound);
        }
        let changed = self.store.add(identity.subject_id, product_id).await?;
        debug!(%product_id, changed, "wishlist add");
        Ok(WishlistChange {
            changed,
            products: self.get(identity).await?,
        })
    }

    #[instrument(skip(self, identity), fields(owner_id = %identity.subject_id))]
    pub async fn remove(&self, identity: &Identity, product_id: ProductId) -> Result<WishlistChange, WishlistError> {
        let changed = self.store.remove(identity.subject_id, product_id).await?;
        Ok(WishlistChange {
            changed,
            products: self.get(identity).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryWishlistStore;
    use shopfront_auth::Role;
    use shopfront_core::UserId;

    fn service() -> WishlistService {
        WishlistService::new(Arc::new(InMemoryWishlistStore::new()), Arc::new(Catalog::seeded()))
    }

    fn customer() -> Identity {
        Identity::new(UserId::new(), "alice@example.com", "Alice", Role::Customer)
    }

    #[tokio::test]
    async fn add_is_idempotent_and_ordered() {
        let svc = service();
        let alice = customer();

        assert!(svc.add(&alice, ProductId::new(3)).await.unwrap().changed);
        assert!(svc.add(&alice, ProductId::new(1)).await.unwrap().changed);
        let again = svc.add(&alice, ProductId::new(3)).await.unwrap();
        assert!(!again.changed);

        let ids: Vec<u32> = again.products.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let svc = service();
        assert_eq!(
            svc.add(&customer(), ProductId::new(999)).await,
            Err(WishlistError::ProductNotFound)
        );
    }

    #[tokio::test]
    async fn wishlists_are_owner_scoped() {
        let svc = service();
        let alice = customer();
        let bob = customer();
        svc.add(&alice, ProductId::new(2)).await.unwrap();

        assert!(svc.get(&bob).await.unwrap().is_empty());
        assert!(!svc.remove(&bob, ProductId::new(2)).await.unwrap().changed);

        let after = svc.remove(&alice, ProductId::new(2)).await.unwrap();
        assert!(after.changed);
        assert!(after.products.is_empty());
    }
}
