use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;

use shopfront_contact::ContactForm;

use crate::app::{dto, errors, extract::ApiJson, services::AppServices};

pub fn router() -> Router {
    Router::new().route("/", post(submit_contact))
}

pub async fn submit_contact(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::ContactRequest>,
) -> Response {
    let form = ContactForm {
        name: body.name,
        email: body.email,
        subject: body.subject,
        message: body.message,
    };
    match services.contact.submit(form, Utc::now()).await {
        Ok(submission) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "success": true, "submission": submission })),
        )
            .into_response(),
        Err(e) => errors::contact_error(e),
    }
}
