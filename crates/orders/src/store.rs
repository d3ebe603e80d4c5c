//! Order persistence port and its in-memory adapter.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use shopfront_core::{OrderId, StoreError, UserId};

use crate::{NewOrder, Order, OrderStatus, TrackingEvent, TrackingInfo};

/// Persistence port for orders.
///
/// Adapters must write an order and its line items atomically and must keep
/// orders for different owners independent.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new `pending` order with a fresh id.
    ///
    /// Rejects empty items or a zero total with `StoreError::Invalid`.
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Order `order_id` if it belongs to `owner_id`.
    async fn get(&self, owner_id: UserId, order_id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Order `order_id` regardless of owner.
    async fn find(&self, order_id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Orders of `owner_id`, newest first.
    async fn list(&self, owner_id: UserId) -> Result<Vec<Order>, StoreError>;

    /// Overwrite the status (last write wins). `entry` is appended to the
    /// tracking history when the order has tracking.
    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        entry: Option<TrackingEvent>,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError>;

    /// Attach carrier details, appending `tracking.history` to any existing history.
    async fn set_tracking(
        &self,
        order_id: OrderId,
        tracking: TrackingInfo,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError>;

    /// Every order, newest first.
    async fn list_all(&self) -> Result<Vec<Order>, StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<OrderId, Order>,
    by_owner: HashMap<UserId, Vec<OrderId>>,
}

/// In-memory order store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<Inner>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
        // UUIDv7 ids break ties between orders created in the same instant.
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        orders
    }
}

fn poisoned() -> StoreError {
    StoreError::unavailable("order store lock poisoned")
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError> {
        order.check().map_err(StoreError::Invalid)?;

        let order = order.into_order(OrderId::new());
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.by_owner.entry(order.owner_id).or_default().push(order.id);
        inner.by_id.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, owner_id: UserId, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .by_id
            .get(&order_id)
            .filter(|o| o.owner_id == owner_id)
            .cloned())
    }

    async fn find(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.by_id.get(&order_id).cloned())
    }

    async fn list(&self, owner_id: UserId) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let orders = inner
            .by_owner
            .get(&owner_id)
            .map(|ids| ids.iter().filter_map(|id| inner.by_id.get(id).cloned()).collect())
            .unwrap_or_default();
        Ok(Self::newest_first(orders))
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        entry: Option<TrackingEvent>,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        Ok(inner.by_id.get_mut(&order_id).map(|order| {
            order.apply_status(status, entry, at);
            order.clone()
        }))
    }

    async fn set_tracking(
        &self,
        order_id: OrderId,
        tracking: TrackingInfo,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        Ok(inner.by_id.get_mut(&order_id).map(|order| {
            order.apply_tracking(tracking, at);
            order.clone()
        }))
    }

    async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(Self::newest_first(inner.by_id.values().cloned().collect()))
    }
}
