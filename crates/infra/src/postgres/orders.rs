use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument};
use uuid::Uuid;

use shopfront_core::{OrderId, ProductId, StoreError, UserId};
use shopfront_orders::{
    Address, LineItem, NewOrder, Order, OrderStatus, OrderStore, TrackingEvent, TrackingInfo,
};

use super::{decode_error, from_db_amount, map_sqlx_error, to_db_amount};

/// Orders, line items and tracking history across three tables.
///
/// An order row and its items are written in one transaction. Reads load the
/// order rows first, then items and history for all of them in two queries.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach items and tracking history to order rows, preserving row order.
    async fn hydrate(&self, operation: &str, rows: Vec<PgRow>) -> Result<Vec<Order>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut orders = rows
            .iter()
            .map(|row| order_from_row(operation, row))
            .collect::<Result<Vec<Order>, StoreError>>()?;
        let ids: Vec<Uuid> = orders.iter().map(|o| *o.id.as_uuid()).collect();

        let item_rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, unit_price
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;

        let mut items: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
        for row in &item_rows {
            let decode = |e: sqlx::Error| decode_error(operation, e);
            let order_id: Uuid = row.try_get("order_id").map_err(decode)?;
            let product_id: i32 = row.try_get("product_id").map_err(decode)?;
            let quantity: i32 = row.try_get("quantity").map_err(decode)?;
            let unit_price: i64 = row.try_get("unit_price").map_err(decode)?;
            items.entry(order_id).or_default().push(LineItem {
                product_id: ProductId::new(u32::try_from(product_id).map_err(|e| decode_error(operation, e))?),
                quantity: u32::try_from(quantity).map_err(|e| decode_error(operation, e))?,
                unit_price: from_db_amount(operation, unit_price)?,
            });
        }

        let event_rows = sqlx::query(
            r#"
            SELECT order_id, status_label, location, occurred_at
            FROM order_tracking_events
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;

        let mut history: HashMap<Uuid, Vec<TrackingEvent>> = HashMap::new();
        for row in &event_rows {
            let decode = |e: sqlx::Error| decode_error(operation, e);
            let order_id: Uuid = row.try_get("order_id").map_err(decode)?;
            history.entry(order_id).or_default().push(TrackingEvent {
                status_label: row.try_get("status_label").map_err(decode)?,
                location: row.try_get("location").map_err(decode)?,
                timestamp: row.try_get("occurred_at").map_err(decode)?,
            });
        }

        for order in &mut orders {
            let key = *order.id.as_uuid();
            order.items = items.remove(&key).unwrap_or_default();
            if let Some(tracking) = order.tracking.as_mut() {
                tracking.history = history.remove(&key).unwrap_or_default();
            }
        }

        Span::current().record("order_count", orders.len());
        Ok(orders)
    }

    async fn fetch_one(&self, operation: &str, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(*order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.hydrate(operation, vec![row]).await?.pop())
    }
}

/// Order columns only; items and history are filled in by `hydrate`.
fn order_from_row(operation: &str, row: &PgRow) -> Result<Order, StoreError> {
    let decode = |e: sqlx::Error| decode_error(operation, e);

    let status: String = row.try_get("status").map_err(decode)?;
    let status = status.parse::<OrderStatus>().map_err(|e| decode_error(operation, e))?;
    let Json(shipping_address): Json<Address> = row.try_get("shipping_address").map_err(decode)?;
    let Json(billing_address): Json<Address> = row.try_get("billing_address").map_err(decode)?;
    let total_amount: i64 = row.try_get("total_amount").map_err(decode)?;

    let carrier: Option<String> = row.try_get("carrier").map_err(decode)?;
    let tracking_number: Option<String> = row.try_get("tracking_number").map_err(decode)?;
    let estimated_delivery: Option<NaiveDate> = row.try_get("estimated_delivery").map_err(decode)?;
    let tracking = match (carrier, tracking_number) {
        (Some(carrier), Some(tracking_number)) => Some(TrackingInfo {
            carrier,
            tracking_number,
            estimated_delivery,
            history: Vec::new(),
        }),
        _ => None,
    };

    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        owner_id: UserId::from_uuid(row.try_get::<Uuid, _>("owner_id").map_err(decode)?),
        items: Vec::new(),
        total_amount: from_db_amount(operation, total_amount)?,
        status,
        shipping_address,
        billing_address,
        payment_method: row.try_get("payment_method").map_err(decode)?,
        payment_reference: row.try_get("payment_reference").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
        tracking,
    })
}

async fn insert_history(
    tx: &mut Transaction<'_, Postgres>,
    operation: &str,
    order_id: OrderId,
    entries: &[TrackingEvent],
) -> Result<(), StoreError> {
    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO order_tracking_events (order_id, status_label, location, occurred_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(*order_id.as_uuid())
        .bind(&entry.status_label)
        .bind(&entry.location)
        .bind(entry.timestamp)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;
    }
    Ok(())
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(skip(self, order), fields(owner_id = %order.owner_id, item_count = order.items.len()), err)]
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError> {
        order.check().map_err(StoreError::Invalid)?;
        let order = order.into_order(OrderId::new());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, owner_id, total_amount, status,
                shipping_address, billing_address,
                payment_method, payment_reference,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(*order.id.as_uuid())
        .bind(*order.owner_id.as_uuid())
        .bind(to_db_amount("create_order", order.total_amount)?)
        .bind(order.status.as_str())
        .bind(Json(&order.shipping_address))
        .bind(Json(&order.billing_address))
        .bind(&order.payment_method)
        .bind(&order.payment_reference)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_order", e))?;

        for (position, item) in order.items.iter().enumerate() {
            let position = i32::try_from(position).map_err(|_| StoreError::Invalid("too many items".to_string()))?;
            let product_id = i32::try_from(item.product_id.get())
                .map_err(|_| StoreError::Invalid(format!("product id {} out of range", item.product_id)))?;
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| StoreError::Invalid(format!("quantity {} out of range", item.quantity)))?;

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(*order.id.as_uuid())
            .bind(position)
            .bind(product_id)
            .bind(quantity)
            .bind(to_db_amount("create_order", item.unit_price)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_order_item", e))?;
        }

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(order)
    }

    #[instrument(skip(self), fields(order_count), err)]
    async fn get(&self, owner_id: UserId, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let rows = sqlx::query("SELECT * FROM orders WHERE id = $1 AND owner_id = $2")
            .bind(*order_id.as_uuid())
            .bind(*owner_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?;
        Ok(self.hydrate("get_order", rows).await?.pop())
    }

    #[instrument(skip(self), fields(order_count), err)]
    async fn find(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        self.fetch_one("find_order", order_id).await
    }

    #[instrument(skip(self), fields(order_count), err)]
    async fn list(&self, owner_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query("SELECT * FROM orders WHERE owner_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(*owner_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?;
        self.hydrate("list_orders", rows).await
    }

    #[instrument(skip(self, entry), fields(order_count), err)]
    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        entry: Option<TrackingEvent>,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let tracked: Option<bool> = sqlx::query_scalar(
            "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING carrier IS NOT NULL",
        )
        .bind(*order_id.as_uuid())
        .bind(status.as_str())
        .bind(at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_status", e))?;

        let Some(tracked) = tracked else {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        };

        if let (true, Some(entry)) = (tracked, entry) {
            insert_history(&mut tx, "update_status", order_id, std::slice::from_ref(&entry)).await?;
        }

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        self.fetch_one("update_status", order_id).await
    }

    #[instrument(skip(self, tracking), fields(order_count), err)]
    async fn set_tracking(
        &self,
        order_id: OrderId,
        tracking: TrackingInfo,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET carrier = $2, tracking_number = $3, estimated_delivery = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(*order_id.as_uuid())
        .bind(&tracking.carrier)
        .bind(&tracking.tracking_number)
        .bind(tracking.estimated_delivery)
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("set_tracking", e))?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        }

        insert_history(&mut tx, "set_tracking", order_id, &tracking.history).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        self.fetch_one("set_tracking", order_id).await
    }

    #[instrument(skip(self), fields(order_count), err)]
    async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_all_orders", e))?;
        self.hydrate("list_all_orders", rows).await
    }
}
