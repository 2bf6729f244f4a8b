//! Product catalogue, scoped to the caller's business.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::models::{new_id, Product};
use crate::state::AppState;
use crate::store::patch_field_count;

use super::require_id;

const COLLECTION: &str = "products";
const NOT_FOUND: ApiError = ApiError::NotFound("Product not found.");

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", collection())
        .route("/:id", get(fetch).patch(update).delete(remove))
}

pub(crate) fn collection() -> MethodRouter<Arc<AppState>> {
    get(list).post(create)
}

#[derive(Deserialize)]
struct CreateProduct {
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: f64,
    #[serde(default)]
    image_url: Option<String>,
}

/// Only fields present and non-null survive serialization, so the patch
/// carries exactly what the client asked to change.
#[derive(Deserialize, Serialize)]
struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

async fn list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Product>>, ApiError> {
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    Ok(Json(scope.list()?))
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    require_id(&id, "product")?;
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    scope.get(&id)?.map(Json).ok_or(NOT_FOUND)
}

async fn create(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Product name is required.".into()));
    }
    if !req.price.is_finite() || req.price < 0.0 {
        return Err(ApiError::Validation("Price must be non-negative.".into()));
    }

    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    let product = Product {
        id: new_id(),
        business_id: scope.business_id().to_owned(),
        name: req.name,
        description: req.description,
        price: req.price,
        image_url: req.image_url,
        created_at: Utc::now(),
    };
    scope.insert(&product.id, &product)?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<ProductPatch>,
) -> Result<Json<Product>, ApiError> {
    require_id(&id, "product")?;
    if let Some(price) = req.price {
        if !price.is_finite() || price < 0.0 {
            return Err(ApiError::Validation("Price must be non-negative.".into()));
        }
    }
    let patch = serde_json::to_value(&req).map_err(crate::store::StoreError::from)?;
    if patch_field_count(&patch) == 0 {
        return Err(ApiError::Validation("No fields provided to update.".into()));
    }

    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    scope.update(&id, &patch)?.map(Json).ok_or(NOT_FOUND)
}

async fn remove(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_id(&id, "product")?;
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    if scope.remove(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(NOT_FOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{app, register, send, test_state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn create_then_cross_tenant_read_is_not_found() {
        let state = test_state();
        let app = app(&state);
        let (acme_token, acme_business) = register(&app, "u1@acme.test", "Acme").await;
        let (other_token, _) = register(&app, "u2@other.test", "Other Co").await;

        let (status, product) = send(
            &app,
            "POST",
            "/products/",
            Some(&acme_token),
            Some(json!({ "name": "Widget", "price": 9.99 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product["price"], 9.99);
        assert_eq!(product["business_id"], acme_business);

        let id = product["id"].as_str().unwrap();
        let path = format!("/products/{id}");

        // Owner sees it; the other tenant gets 404 with the exact id.
        let (status, _) = send(&app, "GET", &path, Some(&acme_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", &path, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Mutations from the other tenant miss too, without leaking 403.
        let (status, _) = send(
            &app,
            "PATCH",
            &path,
            Some(&other_token),
            Some(json!({ "name": "stolen" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", &path, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_patch_rejected_and_document_unchanged() {
        let state = test_state();
        let app = app(&state);
        let (token, _) = register(&app, "patch@acme.test", "Acme").await;

        let (_, product) = send(
            &app,
            "POST",
            "/products/",
            Some(&token),
            Some(json!({ "name": "Widget", "price": 5.0 })),
        )
        .await;
        let path = format!("/products/{}", product["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            "PATCH",
            &path,
            Some(&token),
            Some(json!({ "name": null, "price": null })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "No fields provided to update.");

        let (_, unchanged) = send(&app, "GET", &path, Some(&token), None).await;
        assert_eq!(unchanged["name"], "Widget");
        assert_eq!(unchanged["price"], 5.0);
    }

    #[tokio::test]
    async fn patch_merges_only_provided_fields() {
        let state = test_state();
        let app = app(&state);
        let (token, _) = register(&app, "merge@acme.test", "Acme").await;

        let (_, product) = send(
            &app,
            "POST",
            "/products/",
            Some(&token),
            Some(json!({ "name": "Widget", "price": 5.0, "description": "original" })),
        )
        .await;
        let path = format!("/products/{}", product["id"].as_str().unwrap());

        let (status, updated) = send(
            &app,
            "PATCH",
            &path,
            Some(&token),
            Some(json!({ "price": 7.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["price"], 7.5);
        assert_eq!(updated["name"], "Widget");
        assert_eq!(updated["description"], "original");
    }

    #[tokio::test]
    async fn invalid_id_format_is_400() {
        let state = test_state();
        let app = app(&state);
        let (token, _) = register(&app, "badid@acme.test", "Acme").await;

        let (status, _) = send(&app, "GET", "/products/not-a-uuid", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, "DELETE", "/products/not-a-uuid", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_removes_and_then_404s() {
        let state = test_state();
        let app = app(&state);
        let (token, _) = register(&app, "del@acme.test", "Acme").await;

        let (_, product) = send(
            &app,
            "POST",
            "/products/",
            Some(&token),
            Some(json!({ "name": "Widget", "price": 1.0 })),
        )
        .await;
        let path = format!("/products/{}", product["id"].as_str().unwrap());

        let (status, _) = send(&app, "DELETE", &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn negative_price_rejected() {
        let state = test_state();
        let app = app(&state);
        let (token, _) = register(&app, "price@acme.test", "Acme").await;

        let (status, _) = send(
            &app,
            "POST",
            "/products/",
            Some(&token),
            Some(json!({ "name": "Widget", "price": -1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
