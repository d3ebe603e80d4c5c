//! Request body extractor with the API's error shape.

use axum::{
    Json, async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
    response::Response,
};

use crate::app::errors;

/// `Json<T>` whose rejections are `{"error", "message"}` bodies instead of
/// axum's plain-text defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(errors::body_rejection(rejection)),
        }
    }
}
