use chrono::{DateTime, Utc};
use serde::Serialize;

use shopfront_core::{OrderId, ProductId};

use crate::{Address, Order};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: u64,
    pub line_total: u64,
}

/// Read-only invoice view of an order. Tax and shipping are not charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_number: String,
    pub order_id: OrderId,
    pub date: DateTime<Utc>,
    pub customer_email: Option<String>,
    pub items: Vec<InvoiceLine>,
    pub subtotal: u64,
    pub tax: u64,
    pub shipping: u64,
    pub total: u64,
    pub payment_method: String,
    pub shipping_address: Address,
}

impl Invoice {
    pub fn for_order(order: &Order, customer_email: Option<String>) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| InvoiceLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                // Totals were checked for overflow when the order was placed.
                line_total: item.line_total().unwrap_or(u64::MAX),
            })
            .collect();

        Self {
            invoice_number: format!("INV-{}", order.id),
            order_id: order.id,
            date: order.created_at,
            customer_email,
            items,
            subtotal: order.total_amount,
            tax: 0,
            shipping: 0,
            total: order.total_amount,
            payment_method: order.payment_method.clone(),
            shipping_address: order.shipping_address.clone(),
        }
    }
}
