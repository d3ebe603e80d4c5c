//! Order use cases.
//!
//! Every operation takes the verified [`Identity`] attached by the access
//! gate. Ownership is enforced here: a customer can never observe another
//! customer's order, and the error for "not yours" is the same as for
//! "does not exist".

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, instrument, warn};

use shopfront_auth::Identity;
use shopfront_core::OrderId;
use shopfront_events::EventBus;

use crate::payment::is_cash_on_delivery;
use crate::{
    Address, Invoice, LineItem, NewOrder, Order, OrderError, OrderEvent, OrderPlaced, OrderStatus, OrderStatusChanged,
    OrderStore, PaymentGateway, TrackingEvent, TrackingInfo, TransitionPolicy, compute_total,
};

/// Checkout request. Any total the client computed is not part of it.
#[derive(Debug, Clone, Default)]
pub struct PlaceOrder {
    pub items: Vec<LineItem>,
    pub shipping_address: Option<Address>,
    /// Defaults to the shipping address when absent or blank.
    pub billing_address: Option<Address>,
    pub payment_method: Option<String>,
    /// Capture reference from the payment gateway; unused for cash on delivery.
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateStatus {
    pub status: String,
    pub location: Option<String>,
    /// Skip the forward-only check under a strict policy.
    pub override_transition: bool,
}

#[derive(Debug, Clone)]
pub struct SetTracking {
    pub carrier: String,
    pub tracking_number: String,
    pub estimated_delivery: Option<NaiveDate>,
}

pub struct OrderService<B> {
    store: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentGateway>,
    events: B,
    policy: TransitionPolicy,
}

impl<B> OrderService<B>
where
    B: EventBus<OrderEvent>,
{
    pub fn new(store: Arc<dyn OrderStore>, payments: Arc<dyn PaymentGateway>, events: B) -> Self {
        Self {
            store,
            payments,
            events,
            policy: TransitionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate, confirm payment, persist, then announce a new order.
    ///
    /// Nothing is persisted unless every check passes and the payment is
    /// confirmed (or explicitly skipped for cash on delivery).
    #[instrument(skip(self, identity, req), fields(owner_id = %identity.subject_id, items = req.items.len()))]
    pub async fn place_order(
        &self,
        identity: &Identity,
        req: PlaceOrder,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        if req.items.is_empty() {
            return Err(OrderError::InvalidItems("order must contain at least one item".to_string()));
        }
        let total_amount = compute_total(&req.items)?;

        let shipping_address = req
            .shipping_address
            .ok_or_else(|| OrderError::MissingAddress("shipping address is required".to_string()))?;
        let missing = shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(OrderError::MissingAddress(format!(
                "shipping address is missing: {}",
                missing.join(", ")
            )));
        }

        // A blank billing form means "same as shipping".
        let billing_address = match req.billing_address {
            Some(billing) if !billing.is_blank() => {
                let missing = billing.missing_fields();
                if !missing.is_empty() {
                    return Err(OrderError::MissingAddress(format!(
                        "billing address is missing: {}",
                        missing.join(", ")
                    )));
                }
                billing
            }
            _ => shipping_address.clone(),
        };

        let payment_method = req
            .payment_method
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or(OrderError::MissingPaymentMethod)?;

        let payment_reference = if is_cash_on_delivery(&payment_method) {
            None
        } else {
            let reference = req
                .payment_id
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .ok_or_else(|| OrderError::PaymentFailed("payment reference is required".to_string()))?;
            self.payments
                .confirm(&reference, total_amount)
                .await
                .map_err(|e| OrderError::PaymentFailed(e.to_string()))?;
            Some(reference)
        };

        let order = self
            .store
            .create(NewOrder {
                owner_id: identity.subject_id,
                items: req.items,
                total_amount,
                shipping_address,
                billing_address,
                payment_method,
                payment_reference: payment_reference.clone(),
                created_at: now,
            })
            .await;

        let order = match order {
            Ok(order) => order,
            Err(err) => {
                if let Some(reference) = payment_reference.as_deref() {
                    if let Err(release_err) = self.payments.release(reference).await {
                        warn!(error = %release_err, "failed to release payment after store error");
                    }
                }
                return Err(err.into());
            }
        };

        info!(order_id = %order.id, total_amount, "order placed");

        self.announce(OrderEvent::Placed(OrderPlaced {
            order_id: order.id,
            owner_id: order.owner_id,
            total_amount: order.total_amount,
            item_count: order.items.len(),
            occurred_at: now,
        }));

        Ok(order)
    }

    /// The caller's own orders, newest first.
    pub async fn list_my_orders(&self, identity: &Identity) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list(identity.subject_id).await?)
    }

    /// Owner sees their own order, admin sees any; everything else is `NotFound`.
    #[instrument(skip(self, identity), fields(caller = %identity.subject_id))]
    pub async fn get_order(&self, identity: &Identity, order_id: OrderId) -> Result<Order, OrderError> {
        let found = if identity.is_admin() {
            self.store.find(order_id).await?
        } else {
            self.store.get(identity.subject_id, order_id).await?
        };
        found.ok_or(OrderError::NotFound)
    }

    #[instrument(skip(self, identity, req), fields(caller = %identity.subject_id, status = %req.status))]
    pub async fn update_status(
        &self,
        identity: &Identity,
        order_id: OrderId,
        req: UpdateStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        if !identity.is_admin() {
            return Err(OrderError::Forbidden);
        }
        let to: OrderStatus = req.status.parse()?;

        let current = self.store.find(order_id).await?.ok_or(OrderError::NotFound)?;
        let from = current.status;
        if !self.policy.permits(from, to, req.override_transition) {
            return Err(OrderError::InvalidTransition { from, to });
        }

        let entry = TrackingEvent::for_status(to, req.location.as_deref(), now);
        let order = self
            .store
            .update_status(order_id, to, Some(entry), now)
            .await?
            .ok_or(OrderError::NotFound)?;

        info!(%order_id, %from, %to, "order status updated");

        self.announce(OrderEvent::StatusChanged(OrderStatusChanged {
            order_id,
            owner_id: order.owner_id,
            from,
            to,
            occurred_at: now,
        }));

        Ok(order)
    }

    /// Attach carrier details. The first attachment seeds the history with the
    /// placement entry.
    #[instrument(skip(self, identity, req), fields(caller = %identity.subject_id))]
    pub async fn set_tracking(
        &self,
        identity: &Identity,
        order_id: OrderId,
        req: SetTracking,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        if !identity.is_admin() {
            return Err(OrderError::Forbidden);
        }
        let carrier = req.carrier.trim();
        let tracking_number = req.tracking_number.trim();
        if carrier.is_empty() || tracking_number.is_empty() {
            return Err(OrderError::InvalidTracking(
                "carrier and trackingNumber are required".to_string(),
            ));
        }

        let current = self.store.find(order_id).await?.ok_or(OrderError::NotFound)?;
        let history = if current.tracking.is_none() {
            vec![TrackingEvent::for_status(OrderStatus::Pending, None, current.created_at)]
        } else {
            Vec::new()
        };

        let tracking = TrackingInfo {
            carrier: carrier.to_string(),
            tracking_number: tracking_number.to_string(),
            estimated_delivery: req.estimated_delivery,
            history,
        };

        self.store
            .set_tracking(order_id, tracking, now)
            .await?
            .ok_or(OrderError::NotFound)
    }

    pub async fn list_all_orders(&self, identity: &Identity) -> Result<Vec<Order>, OrderError> {
        if !identity.is_admin() {
            return Err(OrderError::Forbidden);
        }
        Ok(self.store.list_all().await?)
    }

    pub async fn invoice(&self, identity: &Identity, order_id: OrderId) -> Result<Invoice, OrderError> {
        let order = self.get_order(identity, order_id).await?;
        let email = order.shipping_address.email.clone().or_else(|| {
            (order.owner_id == identity.subject_id).then(|| identity.email.clone())
        });
        Ok(Invoice::for_order(&order, email))
    }

    fn announce(&self, event: OrderEvent) {
        let event_type = shopfront_events::Event::event_type(&event);
        if let Err(err) = self.events.publish(event) {
            warn!(event_type, error = ?err, "failed to publish order event");
        }
    }
}
