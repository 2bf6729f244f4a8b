//! HTTP surface: one axum router per resource, merged here.

pub mod admin;
pub mod assets;
pub mod auth;
pub mod business;
pub mod campaigns;
pub mod chat;
pub mod chatlogs;
pub mod customers;
pub mod posters;
pub mod products;
pub mod websites;

use std::sync::Arc;

use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .nest("/auth", auth::router())
        .nest("/business", business::router())
        .merge(resource("/products", products::router(), products::collection()))
        .merge(resource("/websites", websites::router(), websites::collection()))
        .merge(resource("/campaigns", campaigns::router(), campaigns::collection()))
        .merge(resource("/posters", posters::router(), posters::collection()))
        .merge(resource("/customers", customers::router(), customers::collection()))
        .merge(resource("/chatlogs", chatlogs::router(), chatlogs::collection()))
        .merge(resource("/assets", assets::router(), assets::collection()))
        .merge(resource("/chat", chat::router(), chat::collection()))
        .nest("/admin", admin::router())
        .with_state(state)
}

/// Nesting maps the inner "/" route to `prefix` only, so the
/// trailing-slash form of each collection path is registered explicitly.
fn resource(
    prefix: &str,
    router: Router<Arc<AppState>>,
    collection: MethodRouter<Arc<AppState>>,
) -> Router<Arc<AppState>> {
    Router::new()
        .nest(prefix, router)
        .route(&format!("{prefix}/"), collection)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "bizmate API is running" }))
}

/// Reject ids that are not well-formed UUIDs before they reach the store.
pub(crate) fn require_id(raw: &str, what: &str) -> Result<(), ApiError> {
    Uuid::parse_str(raw)
        .map(|_| ())
        .map_err(|_| ApiError::Validation(format!("Invalid {what} ID format.")))
}
