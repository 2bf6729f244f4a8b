//! Website projects. Patches bump the version counter and refresh
//! `updated_at` alongside whatever the client changed.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::models::{new_id, Website};
use crate::state::AppState;
use crate::store::{patch_field_count, StoreError};

use super::require_id;

const COLLECTION: &str = "websites";
const NOT_FOUND: ApiError = ApiError::NotFound("Website not found.");

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", collection())
        .route("/:id", get(fetch).patch(update).delete(remove))
}

pub(crate) fn collection() -> MethodRouter<Arc<AppState>> {
    get(list).post(create)
}

#[derive(Deserialize)]
struct CreateWebsite {
    template: String,
    #[serde(default)]
    content_json: Option<Value>,
    #[serde(default)]
    project_name: Option<String>,
    #[serde(default)]
    published_url: Option<String>,
}

#[derive(Deserialize, Serialize)]
struct WebsitePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_url: Option<String>,
}

async fn list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Website>>, ApiError> {
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    Ok(Json(scope.list()?))
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Website>, ApiError> {
    require_id(&id, "website")?;
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    scope.get(&id)?.map(Json).ok_or(NOT_FOUND)
}

async fn create(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CreateWebsite>,
) -> Result<(StatusCode, Json<Website>), ApiError> {
    if req.template.trim().is_empty() {
        return Err(ApiError::Validation("Template is required.".into()));
    }

    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    let now = Utc::now();
    let website = Website {
        id: new_id(),
        business_id: scope.business_id().to_owned(),
        template: req.template,
        content_json: req.content_json.unwrap_or_else(|| json!({})),
        project_name: req.project_name,
        published_url: req.published_url,
        version: 1,
        created_at: now,
        updated_at: now,
    };
    scope.insert(&website.id, &website)?;
    Ok((StatusCode::CREATED, Json(website)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<WebsitePatch>,
) -> Result<Json<Website>, ApiError> {
    require_id(&id, "website")?;
    let mut patch = serde_json::to_value(&req).map_err(StoreError::from)?;
    // Count before the bookkeeping fields are added; an all-null body is
    // still an empty patch.
    if patch_field_count(&patch) == 0 {
        return Err(ApiError::Validation("No fields provided to update.".into()));
    }

    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    let current: Website = scope.get(&id)?.ok_or(NOT_FOUND)?;
    if let Some(obj) = patch.as_object_mut() {
        obj.insert("version".into(), json!(current.version + 1));
        obj.insert("updated_at".into(), json!(Utc::now()));
    }
    scope.update(&id, &patch)?.map(Json).ok_or(NOT_FOUND)
}

async fn remove(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_id(&id, "website")?;
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    if scope.remove(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(NOT_FOUND)
    }
}
