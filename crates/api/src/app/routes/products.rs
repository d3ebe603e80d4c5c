use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use shopfront_core::ProductId;

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ProductsQuery>,
) -> Response {
    let products = services.catalog.list(query.mood.as_deref());
    Json(serde_json::json!({ "products": products })).into_response()
}

pub async fn get_product(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<ProductId>() else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "Product not found");
    };
    match services.catalog.get(id) {
        Ok(product) => Json(serde_json::json!({ "product": product })).into_response(),
        Err(_) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Product not found"),
    }
}

pub async fn moods(Extension(services): Extension<Arc<AppServices>>) -> Response {
    Json(serde_json::json!({ "moods": services.catalog.moods() })).into_response()
}
