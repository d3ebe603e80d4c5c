use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};

use shopfront_core::SubmissionId;

use crate::app::{dto, errors, extract::ApiJson, services::AppServices};
use crate::context::CallerContext;

/// Back office. The gate only lets admin identities this far; the services
/// check the role again.
pub fn router() -> Router {
    Router::new()
        .route("/contact", get(list_submissions))
        .route("/contact/:id", patch(set_submission_read))
        .route("/orders", get(list_all_orders))
        .route("/users", get(list_users))
}

pub async fn list_submissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Response {
    match services.contact.list(caller.identity()).await {
        Ok(submissions) => Json(serde_json::json!({ "submissions": submissions })).into_response(),
        Err(e) => errors::contact_error(e),
    }
}

pub async fn set_submission_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::SetReadRequest>,
) -> Response {
    let Ok(id) = id.parse::<SubmissionId>() else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "Submission not found");
    };
    match services.contact.set_read(caller.identity(), id, body.is_read).await {
        Ok(submission) => Json(serde_json::json!({ "submission": submission })).into_response(),
        Err(e) => errors::contact_error(e),
    }
}

pub async fn list_all_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Response {
    match services.orders.list_all_orders(caller.identity()).await {
        Ok(orders) => Json(serde_json::json!({ "orders": orders })).into_response(),
        Err(e) => errors::order_error(e),
    }
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Response {
    match services.accounts.list_users(caller.identity()).await {
        Ok(users) => Json(serde_json::json!({ "users": users })).into_response(),
        Err(e) => errors::account_error(e),
    }
}
