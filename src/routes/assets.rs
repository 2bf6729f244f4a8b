//! Brand vault: folders, notes, files and images, one level of
//! containment at a time. Deleting a folder removes its direct children
//! only; grandchildren survive as orphans reachable by id.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::models::{new_id, Asset, AssetKind};
use crate::state::AppState;
use crate::store::{patch_field_count, StoreError};
use crate::tenancy::BusinessScope;

use super::require_id;

const COLLECTION: &str = "assets";
const NOT_FOUND: ApiError = ApiError::NotFound("Asset not found.");

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", collection())
        .route("/:id", get(fetch).patch(update).delete(remove))
}

pub(crate) fn collection() -> MethodRouter<Arc<AppState>> {
    get(list).post(create)
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    parent_folder_id: Option<String>,
}

#[derive(Deserialize)]
struct CreateAsset {
    name: String,
    kind: AssetKind,
    #[serde(default)]
    parent_folder_id: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    file_url: Option<String>,
}

#[derive(Deserialize, Serialize)]
struct AssetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_folder_id: Option<String>,
}

/// The parent must exist in this scope and actually be a folder.
fn check_parent(scope: &BusinessScope, parent_id: &str) -> Result<(), ApiError> {
    require_id(parent_id, "folder")?;
    match scope.get::<Asset>(parent_id)? {
        Some(parent) if parent.kind == AssetKind::Folder => Ok(()),
        _ => Err(ApiError::NotFound("Parent folder not found.")),
    }
}

async fn list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Asset>>, ApiError> {
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    let assets: Vec<Asset> = scope.list()?;
    let filtered = assets
        .into_iter()
        .filter(|asset| asset.parent_folder_id == params.parent_folder_id)
        .collect();
    Ok(Json(filtered))
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Asset>, ApiError> {
    require_id(&id, "asset")?;
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    scope.get(&id)?.map(Json).ok_or(NOT_FOUND)
}

async fn create(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CreateAsset>,
) -> Result<(StatusCode, Json<Asset>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Asset name is required.".into()));
    }

    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    if let Some(parent_id) = &req.parent_folder_id {
        check_parent(&scope, parent_id)?;
    }

    let now = Utc::now();
    let asset = Asset {
        id: new_id(),
        business_id: scope.business_id().to_owned(),
        name: req.name,
        kind: req.kind,
        parent_folder_id: req.parent_folder_id,
        content: req.content,
        file_url: req.file_url,
        created_at: now,
        updated_at: now,
    };
    scope.insert(&asset.id, &asset)?;
    Ok((StatusCode::CREATED, Json(asset)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<AssetPatch>,
) -> Result<Json<Asset>, ApiError> {
    require_id(&id, "asset")?;
    let mut patch = serde_json::to_value(&req).map_err(StoreError::from)?;
    if patch_field_count(&patch) == 0 {
        return Err(ApiError::Validation("No fields provided to update.".into()));
    }

    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    if let Some(parent_id) = &req.parent_folder_id {
        check_parent(&scope, parent_id)?;
    }
    if let Some(obj) = patch.as_object_mut() {
        obj.insert("updated_at".into(), json!(Utc::now()));
    }
    scope.update(&id, &patch)?.map(Json).ok_or(NOT_FOUND)
}

async fn remove(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_id(&id, "asset")?;
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    let Some(asset) = scope.get::<Asset>(&id)? else {
        return Err(NOT_FOUND);
    };

    if asset.kind == AssetKind::Folder {
        // Single-level cascade: direct children go with the folder.
        let children: Vec<Asset> = scope.list()?;
        for child in children {
            if child.parent_folder_id.as_deref() == Some(id.as_str()) {
                scope.remove(&child.id)?;
            }
        }
    }
    scope.remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
