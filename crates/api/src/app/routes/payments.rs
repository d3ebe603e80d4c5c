use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::info;

use shopfront_orders::CaptureRequest;

use crate::app::{dto, errors, extract::ApiJson, services::AppServices};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new().route("/", post(capture_payment))
}

/// Capture a payment ahead of checkout; the returned id goes into `POST /orders`.
pub async fn capture_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<dto::PaymentRequest>,
) -> Response {
    let request = CaptureRequest {
        method: body.payment_method,
        amount: body.amount,
        details: body.payment_details,
    };
    match services.payments.capture(request).await {
        Ok(payment) => {
            info!(user_id = %caller.subject_id(), payment_id = %payment.id, "payment captured");
            Json(serde_json::json!({ "success": true, "payment": payment })).into_response()
        }
        Err(e) => errors::payment_error(e),
    }
}
