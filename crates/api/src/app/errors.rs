//! Domain error → HTTP response mapping.
//!
//! Every handler funnels failures through here so the status codes and the
//! `{"error", "message"}` body shape stay consistent. Storage failures are
//! logged and reported without detail.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use shopfront_auth::AccountError;
use shopfront_contact::ContactError;
use shopfront_core::StoreError;
use shopfront_infra::notifications::NotificationError;
use shopfront_orders::{OrderError, PaymentError};
use shopfront_wishlist::WishlistError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// A request body that is not valid JSON for the endpoint.
pub fn body_rejection(rejection: JsonRejection) -> axum::response::Response {
    match rejection {
        JsonRejection::MissingJsonContentType(r) => {
            json_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type", r.body_text())
        }
        other => json_error(StatusCode::BAD_REQUEST, "validation_error", other.body_text()),
    }
}

pub fn internal_error(context: &str, err: impl core::fmt::Display) -> axum::response::Response {
    error!(context, error = %err, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal server error")
}

pub fn store_error(context: &str, err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Invalid(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        err @ StoreError::Unavailable(_) => internal_error(context, err),
    }
}

pub fn order_error(err: OrderError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        OrderError::InvalidItems(_) => json_error(StatusCode::BAD_REQUEST, "invalid_items", message),
        OrderError::MissingAddress(_) => json_error(StatusCode::BAD_REQUEST, "missing_address", message),
        OrderError::MissingPaymentMethod => json_error(StatusCode::BAD_REQUEST, "missing_payment_method", message),
        OrderError::PaymentFailed(_) => json_error(StatusCode::PAYMENT_REQUIRED, "payment_failed", message),
        OrderError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "Order not found"),
        OrderError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "Forbidden"),
        OrderError::InvalidStatus(_) => json_error(StatusCode::BAD_REQUEST, "invalid_status", message),
        OrderError::InvalidTransition { .. } => json_error(StatusCode::CONFLICT, "invalid_transition", message),
        OrderError::InvalidTracking(_) => json_error(StatusCode::BAD_REQUEST, "invalid_tracking", message),
        OrderError::Store(e) => store_error("orders", e),
    }
}

pub fn payment_error(err: PaymentError) -> axum::response::Response {
    match err {
        PaymentError::Invalid(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_payment", msg),
        err @ PaymentError::Declined(_) => json_error(StatusCode::PAYMENT_REQUIRED, "payment_failed", err.to_string()),
        err @ PaymentError::Unavailable(_) => internal_error("payments", err),
    }
}

pub fn account_error(err: AccountError) -> axum::response::Response {
    match err {
        AccountError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AccountError::EmailTaken => json_error(StatusCode::BAD_REQUEST, "email_taken", "Email already exists"),
        AccountError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "Invalid email or password")
        }
        AccountError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "Forbidden"),
        err @ AccountError::Token(_) => internal_error("accounts", err),
        AccountError::Store(e) => store_error("accounts", e),
    }
}

pub fn wishlist_error(err: WishlistError) -> axum::response::Response {
    match err {
        WishlistError::ProductNotFound => json_error(StatusCode::NOT_FOUND, "not_found", "Product not found"),
        WishlistError::Store(e) => store_error("wishlist", e),
    }
}

pub fn contact_error(err: ContactError) -> axum::response::Response {
    match err {
        ContactError::Validation(_) => json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Name, email, and message are required",
        ),
        ContactError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "Forbidden"),
        ContactError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "Submission not found"),
        ContactError::Store(e) => store_error("contact", e),
    }
}

pub fn notification_error(err: NotificationError) -> axum::response::Response {
    internal_error("notifications", err)
}
