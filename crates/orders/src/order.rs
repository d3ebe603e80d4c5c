use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shopfront_core::{Entity, OrderId, ProductId, UserId};

use crate::OrderError;

/// Order status lifecycle.
///
/// `pending → processing → shipped → delivered`. `delivered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// Human label used in tracking history.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Order Placed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
        }
    }

    fn default_location(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Online",
            OrderStatus::Processing => "Warehouse",
            OrderStatus::Shipped => "In Transit",
            OrderStatus::Delivered => "Destination",
        }
    }

    /// The single forward step from this status, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Processing),
            OrderStatus::Processing => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    /// Forward-only rule: same status (no-op) or exactly one step ahead.
    pub fn can_advance_to(&self, to: OrderStatus) -> bool {
        *self == to || self.next() == Some(to)
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| {
                OrderError::InvalidStatus(format!(
                    "status must be one of: pending, processing, shipped, delivered (got '{s}')"
                ))
            })
    }
}

/// How strictly admin status changes are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any status may be set from any status.
    #[default]
    Permissive,
    /// Only forward single steps, unless the caller asks for an override.
    Strict,
}

impl TransitionPolicy {
    pub fn permits(&self, from: OrderStatus, to: OrderStatus, override_requested: bool) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => override_requested || from.can_advance_to(to),
        }
    }
}

/// Order line: product, quantity, unit price. Fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

impl LineItem {
    pub fn line_total(&self) -> Option<u64> {
        self.unit_price.checked_mul(u64::from(self.quantity))
    }
}

/// Sum of `unit_price * quantity` over `items`, rejecting overflow and
/// zero quantities.
pub fn compute_total(items: &[LineItem]) -> Result<u64, OrderError> {
    items.iter().try_fold(0u64, |acc, item| {
        if item.quantity == 0 {
            return Err(OrderError::InvalidItems(format!(
                "quantity for product {} must be at least 1",
                item.product_id
            )));
        }
        item.line_total()
            .and_then(|line| acc.checked_add(line))
            .ok_or_else(|| OrderError::InvalidItems("order total overflows".to_string()))
    })
}

/// Postal address snapshot captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

const REQUIRED_ADDRESS_FIELDS: usize = 6;

impl Address {
    /// Every required field is empty.
    pub fn is_blank(&self) -> bool {
        self.missing_fields().len() == REQUIRED_ADDRESS_FIELDS
    }

    /// Names of required fields that are blank. `state` is optional.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("street", &self.street),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// One entry of a shipment's history. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub status_label: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
}

impl TrackingEvent {
    /// History entry for a move to `status`, at `location` or the status's default.
    pub fn for_status(status: OrderStatus, location: Option<&str>, at: DateTime<Utc>) -> Self {
        let location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(status.default_location());
        Self {
            status_label: status.label().to_string(),
            location: location.to_string(),
            timestamp: at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub carrier: String,
    pub tracking_number: String,
    pub estimated_delivery: Option<NaiveDate>,
    pub history: Vec<TrackingEvent>,
}

/// Input to `OrderStore::create`: everything except the store-assigned fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub owner_id: UserId,
    pub items: Vec<LineItem>,
    pub total_amount: u64,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Store-side acceptance check: items present, total positive.
    pub fn check(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("order must contain at least one item".to_string());
        }
        if self.total_amount == 0 {
            return Err("order total must be positive".to_string());
        }
        Ok(())
    }

    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            owner_id: self.owner_id,
            items: self.items,
            total_amount: self.total_amount,
            status: OrderStatus::Pending,
            shipping_address: self.shipping_address,
            billing_address: self.billing_address,
            payment_method: self.payment_method,
            payment_reference: self.payment_reference,
            created_at: self.created_at,
            updated_at: self.created_at,
            tracking: None,
        }
    }
}

/// A placed order.
///
/// # Invariants
/// - `items` and `total_amount` never change after creation.
/// - `total_amount` equals the sum of line totals at creation.
/// - Tracking history only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub owner_id: UserId,
    pub items: Vec<LineItem>,
    pub total_amount: u64,
    pub status: OrderStatus,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingInfo>,
}

impl Order {
    /// Overwrite the status; append `entry` to the history when tracking exists.
    pub fn apply_status(&mut self, status: OrderStatus, entry: Option<TrackingEvent>, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
        if let (Some(tracking), Some(entry)) = (self.tracking.as_mut(), entry) {
            tracking.history.push(entry);
        }
    }

    /// Attach or replace carrier details, keeping any existing history.
    pub fn apply_tracking(&mut self, mut tracking: TrackingInfo, at: DateTime<Utc>) {
        if let Some(existing) = self.tracking.take() {
            let mut history = existing.history;
            history.extend(tracking.history.drain(..));
            tracking.history = history;
        }
        self.tracking = Some(tracking);
        self.updated_at = at;
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(product: u32, quantity: u32, unit_price: u64) -> LineItem {
        LineItem {
            product_id: ProductId::new(product),
            quantity,
            unit_price,
        }
    }

    fn address() -> Address {
        Address {
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            street: "1 Rabbit Hole".into(),
            city: "Oxford".into(),
            state: String::new(),
            postal_code: "OX1".into(),
            country: "GB".into(),
            email: None,
            phone: None,
        }
    }

    #[test]
    fn total_is_sum_of_line_totals() {
        let items = vec![item(1, 1, 1999), item(3, 1, 3999)];
        assert_eq!(compute_total(&items).unwrap(), 5998);
        assert_eq!(compute_total(&[item(8, 3, 999)]).unwrap(), 2997);
    }

    #[test]
    fn zero_quantity_and_overflow_are_invalid_items() {
        assert!(matches!(compute_total(&[item(1, 0, 100)]), Err(OrderError::InvalidItems(_))));
        assert!(matches!(
            compute_total(&[item(1, u32::MAX, u64::MAX)]),
            Err(OrderError::InvalidItems(_))
        ));
    }

    #[test]
    fn forward_transitions_follow_the_table() {
        use OrderStatus::*;
        assert!(Pending.can_advance_to(Processing));
        assert!(Processing.can_advance_to(Shipped));
        assert!(Shipped.can_advance_to(Delivered));
        assert!(Shipped.can_advance_to(Shipped));
        assert!(!Pending.can_advance_to(Shipped));
        assert!(!Delivered.can_advance_to(Pending));
        assert!(Delivered.is_terminal());
    }

    #[test]
    fn policies() {
        use OrderStatus::*;
        assert!(TransitionPolicy::Permissive.permits(Delivered, Pending, false));
        assert!(!TransitionPolicy::Strict.permits(Delivered, Pending, false));
        assert!(TransitionPolicy::Strict.permits(Delivered, Pending, true));
        assert!(TransitionPolicy::Strict.permits(Pending, Processing, false));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!(matches!("cancelled".parse::<OrderStatus>(), Err(OrderError::InvalidStatus(_))));
    }

    #[test]
    fn address_reports_blank_required_fields() {
        let mut a = address();
        assert!(a.missing_fields().is_empty());
        a.city = "  ".into();
        a.country.clear();
        assert_eq!(a.missing_fields(), vec!["city", "country"]);
        assert!(!a.is_blank());
        assert!(Address::default().is_blank());
    }

    #[test]
    fn status_change_appends_history_only_when_tracked() {
        let now = Utc::now();
        let new = NewOrder {
            owner_id: UserId::new(),
            items: vec![item(1, 1, 100)],
            total_amount: 100,
            shipping_address: address(),
            billing_address: address(),
            payment_method: "paypal".into(),
            payment_reference: Some("PP-1".into()),
            created_at: now,
        };
        let mut order = new.into_order(OrderId::new());

        order.apply_status(
            OrderStatus::Processing,
            Some(TrackingEvent::for_status(OrderStatus::Processing, None, now)),
            now,
        );
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(order.tracking.is_none());

        order.apply_tracking(
            TrackingInfo {
                carrier: "FedEx".into(),
                tracking_number: "FX1".into(),
                estimated_delivery: None,
                history: vec![TrackingEvent::for_status(OrderStatus::Pending, None, now)],
            },
            now,
        );
        order.apply_status(
            OrderStatus::Shipped,
            Some(TrackingEvent::for_status(OrderStatus::Shipped, Some("Memphis, TN"), now)),
            now,
        );

        let history = &order.tracking.as_ref().unwrap().history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status_label, "Order Placed");
        assert_eq!(history[1].location, "Memphis, TN");
    }

    #[test]
    fn order_serializes_with_camel_case_keys() {
        let order = NewOrder {
            owner_id: UserId::new(),
            items: vec![item(1, 2, 50)],
            total_amount: 100,
            shipping_address: address(),
            billing_address: address(),
            payment_method: "cash_on_delivery".into(),
            payment_reference: None,
            created_at: Utc::now(),
        }
        .into_order(OrderId::new());

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["totalAmount"], 100);
        assert_eq!(json["items"][0]["unitPrice"], 50);
        assert!(json.get("tracking").is_none());
    }

    proptest! {
        #[test]
        fn total_matches_wide_sum(lines in prop::collection::vec((1u32..50, 1u32..20, 0u64..100_000), 1..12)) {
            let items: Vec<LineItem> = lines.iter().map(|&(p, q, u)| item(p, q, u)).collect();
            let expected: u128 = lines.iter().map(|&(_, q, u)| u128::from(q) * u128::from(u)).sum();
            prop_assert_eq!(u128::from(compute_total(&items).unwrap()), expected);
        }
    }
}
