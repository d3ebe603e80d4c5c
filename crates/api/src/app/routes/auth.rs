use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;

use shopfront_auth::{Session, SignUp};

use crate::app::services::AppServices;
use crate::app::{dto, errors, extract::ApiJson};
use crate::context::SessionSettings;
use crate::middleware::{append_cookie, clear_session_cookie, session_cookie};

pub fn router() -> Router {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/signin", post(sign_in))
        .route("/signout", post(sign_out))
}

fn with_session_cookie(mut response: Response, session: &Session, settings: SessionSettings) -> Response {
    append_cookie(&mut response, &session_cookie(&session.token.token, settings));
    response
}

pub async fn sign_up(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::SignUpRequest>,
) -> Response {
    let req = SignUp {
        name: body.name,
        email: body.email,
        password: body.password,
    };
    let session = match services.accounts.sign_up(req, Utc::now()).await {
        Ok(s) => s,
        Err(e) => return errors::account_error(e),
    };

    let response = (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "user": session.user,
            "token": session.token.token,
        })),
    )
        .into_response();
    with_session_cookie(response, &session, services.session)
}

pub async fn sign_in(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::SignInRequest>,
) -> Response {
    let session = match services.accounts.sign_in(&body.email, &body.password, Utc::now()).await {
        Ok(s) => s,
        Err(e) => return errors::account_error(e),
    };

    let response = Json(serde_json::json!({
        "success": true,
        "user": session.user,
        "token": session.token.token,
    }))
    .into_response();
    with_session_cookie(response, &session, services.session)
}

pub async fn sign_out(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let mut response = Json(serde_json::json!({ "success": true })).into_response();
    append_cookie(&mut response, &clear_session_cookie(services.session));
    response
}
