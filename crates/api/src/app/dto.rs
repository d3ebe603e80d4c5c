//! Request bodies. Keys are camelCase on the wire.
//!
//! Text fields default to empty so a missing field reaches the service and
//! gets the same validation error as a blank one.

use chrono::NaiveDate;
use serde::Deserialize;

use shopfront_core::ProductId;
use shopfront_orders::{Address, PaymentDetails};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// One cart line. The unit price is looked up in the catalog.
///
/// Both fields are read leniently so a missing or negative value is reported
/// as an invalid item rather than a malformed body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderItemRequest {
    #[serde(alias = "id")]
    pub product_id: Option<ProductId>,
    pub quantity: Option<i64>,
}

/// Checkout body. Any client-side total is not part of it and is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub payment_method: Option<String>,
    pub payment_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub location: Option<String>,
    #[serde(rename = "override")]
    pub override_transition: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackingRequest {
    pub carrier: String,
    pub tracking_number: String,
    pub estimated_delivery: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WishlistAddRequest {
    pub product_id: Option<ProductId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetReadRequest {
    pub is_read: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentRequest {
    /// Amount in cents.
    pub amount: u64,
    pub payment_method: String,
    pub payment_details: PaymentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductsQuery {
    pub mood: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checkout_body_ignores_client_total() {
        let body: PlaceOrderRequest = serde_json::from_value(json!({
            "items": [{"productId": 1, "quantity": 2, "price": 1}],
            "total": 1,
            "paymentMethod": "cash_on_delivery",
            "shippingAddress": {"firstName": "A", "lastName": "B", "street": "S", "city": "C", "postalCode": "P", "country": "X"}
        }))
        .unwrap();
        assert_eq!(body.items[0].product_id, Some(ProductId::new(1)));
        assert_eq!(body.items[0].quantity, Some(2));
        assert_eq!(body.shipping_address.unwrap().postal_code, "P");
        assert!(body.billing_address.is_none());
    }

    #[test]
    fn incomplete_cart_lines_still_parse() {
        let body: PlaceOrderRequest = serde_json::from_value(json!({
            "items": [{"productId": 1}, {"id": 3, "quantity": -2}]
        }))
        .unwrap();
        assert_eq!(body.items[0].quantity, None);
        assert_eq!(body.items[1].product_id, Some(ProductId::new(3)));
        assert_eq!(body.items[1].quantity, Some(-2));
    }

    #[test]
    fn override_flag_uses_its_wire_name() {
        let body: UpdateStatusRequest = serde_json::from_value(json!({"status": "pending", "override": true})).unwrap();
        assert!(body.override_transition);
    }
}
