use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use chrono::Utc;

use shopfront_catalog::Catalog;
use shopfront_core::OrderId;
use shopfront_orders::{LineItem, OrderError, PlaceOrder, SetTracking, UpdateStatus};

use crate::app::{dto, errors, extract::ApiJson, services::AppServices};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_my_orders).post(place_order))
        .route("/:id", get(get_order).patch(update_status))
        .route("/:id/invoice", get(get_invoice))
        .route("/:id/tracking", put(set_tracking))
}

fn parse_order_id(id: &str) -> Result<OrderId, Response> {
    // An unparsable id cannot name an order the caller owns.
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::NOT_FOUND, "not_found", "Order not found"))
}

/// Check each cart line and price it from the catalog.
fn price_items(catalog: &Catalog, items: Vec<dto::OrderItemRequest>) -> Result<Vec<LineItem>, OrderError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let product_id = item
                .product_id
                .ok_or_else(|| OrderError::InvalidItems(format!("item {index} has no productId")))?;
            let quantity = item
                .quantity
                .and_then(|q| u32::try_from(q).ok())
                .filter(|q| *q > 0)
                .ok_or_else(|| OrderError::InvalidItems(format!("item {index} needs a positive quantity")))?;
            let product = catalog
                .get(product_id)
                .map_err(|_| OrderError::InvalidItems(format!("unknown product {product_id}")))?;
            Ok(LineItem {
                product_id,
                quantity,
                unit_price: product.price,
            })
        })
        .collect()
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<dto::PlaceOrderRequest>,
) -> Response {
    let items = match price_items(&services.catalog, body.items) {
        Ok(items) => items,
        Err(e) => return errors::order_error(e),
    };

    let req = PlaceOrder {
        items,
        shipping_address: body.shipping_address,
        billing_address: body.billing_address,
        payment_method: body.payment_method,
        payment_id: body.payment_id,
    };

    match services.orders.place_order(caller.identity(), req, Utc::now()).await {
        Ok(order) => (StatusCode::CREATED, Json(serde_json::json!({ "order": order }))).into_response(),
        Err(e) => errors::order_error(e),
    }
}

pub async fn list_my_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Response {
    match services.orders.list_my_orders(caller.identity()).await {
        Ok(orders) => Json(serde_json::json!({ "orders": orders })).into_response(),
        Err(e) => errors::order_error(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.orders.get_order(caller.identity(), order_id).await {
        Ok(order) => Json(serde_json::json!({ "order": order })).into_response(),
        Err(e) => errors::order_error(e),
    }
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.orders.invoice(caller.identity(), order_id).await {
        Ok(invoice) => Json(serde_json::json!({ "invoice": invoice })).into_response(),
        Err(e) => errors::order_error(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::UpdateStatusRequest>,
) -> Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let req = UpdateStatus {
        status: body.status,
        location: body.location,
        override_transition: body.override_transition,
    };
    match services.orders.update_status(caller.identity(), order_id, req, Utc::now()).await {
        Ok(order) => Json(serde_json::json!({ "order": order })).into_response(),
        Err(e) => errors::order_error(e),
    }
}

pub async fn set_tracking(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::TrackingRequest>,
) -> Response {
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let req = SetTracking {
        carrier: body.carrier,
        tracking_number: body.tracking_number,
        estimated_delivery: body.estimated_delivery,
    };
    match services.orders.set_tracking(caller.identity(), order_id, req, Utc::now()).await {
        Ok(order) => Json(serde_json::json!({ "order": order })).into_response(),
        Err(e) => errors::order_error(e),
    }
}
