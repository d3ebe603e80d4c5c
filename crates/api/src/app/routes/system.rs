use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use crate::context::CallerContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(caller): Extension<CallerContext>) -> impl IntoResponse {
    let identity = caller.identity();
    Json(serde_json::json!({
        "id": identity.subject_id.to_string(),
        "email": identity.email,
        "name": identity.name,
        "role": identity.role.as_str(),
    }))
}
