use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};

use shopfront_core::ProductId;

use crate::app::{dto, errors, extract::ApiJson, services::AppServices};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_wishlist).post(add_to_wishlist))
        .route("/:product_id", delete(remove_from_wishlist))
}

pub async fn get_wishlist(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Response {
    match services.wishlist.get(caller.identity()).await {
        Ok(products) => Json(serde_json::json!({ "wishlist": products })).into_response(),
        Err(e) => errors::wishlist_error(e),
    }
}

pub async fn add_to_wishlist(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<dto::WishlistAddRequest>,
) -> Response {
    let Some(product_id) = body.product_id else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "Product ID is required");
    };
    match services.wishlist.add(caller.identity(), product_id).await {
        Ok(change) => {
            let message = if change.changed {
                "Product added to wishlist"
            } else {
                "Product already in wishlist"
            };
            Json(serde_json::json!({
                "success": true,
                "added": change.changed,
                "message": message,
                "wishlist": change.products,
            }))
            .into_response()
        }
        Err(e) => errors::wishlist_error(e),
    }
}

pub async fn remove_from_wishlist(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(product_id): Path<String>,
) -> Response {
    let Ok(product_id) = product_id.parse::<ProductId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "Invalid product ID");
    };
    match services.wishlist.remove(caller.identity(), product_id).await {
        Ok(change) => Json(serde_json::json!({
            "success": true,
            "removed": change.changed,
            "wishlist": change.products,
        }))
        .into_response(),
        Err(e) => errors::wishlist_error(e),
    }
}
