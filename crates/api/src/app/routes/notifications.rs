use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use shopfront_core::NotificationId;

use crate::app::{errors, services::AppServices};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", post(mark_read))
}

pub async fn list_notifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Response {
    match services.notifications.list(caller.subject_id()) {
        Ok(list) => Json(serde_json::json!({ "notifications": list })).into_response(),
        Err(e) => errors::notification_error(e),
    }
}

pub async fn mark_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Response {
    let not_found = || errors::json_error(StatusCode::NOT_FOUND, "not_found", "Notification not found");
    let Ok(id) = id.parse::<NotificationId>() else {
        return not_found();
    };
    match services.notifications.mark_read(caller.subject_id(), id) {
        Ok(Some(n)) => Json(serde_json::json!({ "notification": n })).into_response(),
        Ok(None) => not_found(),
        Err(e) => errors::notification_error(e),
    }
}
