//! The caller's business profile, addressed as `/me` — there is no
//! cross-business read path here at all.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::models::Business;
use crate::state::AppState;
use crate::store::{patch_field_count, StoreError};

const NOT_FOUND: ApiError = ApiError::NotFound("Business not found.");

const ALLOWED_LOGO_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/svg+xml",
];

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(fetch).patch(update))
        .route("/me/logo", post(upload_logo))
}

#[derive(Deserialize, Serialize)]
struct BusinessPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    brand_tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offerings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    brand_colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferred_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logo_url: Option<String>,
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Business>, ApiError> {
    state
        .store
        .get_business(identity.business_id()?)?
        .map(Json)
        .ok_or(NOT_FOUND)
}

async fn update(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<BusinessPatch>,
) -> Result<Json<Business>, ApiError> {
    let patch = serde_json::to_value(&req).map_err(StoreError::from)?;
    if patch_field_count(&patch) == 0 {
        return Err(ApiError::Validation("No fields provided to update.".into()));
    }
    state
        .store
        .patch_business(identity.business_id()?, &patch)?
        .map(Json)
        .ok_or(NOT_FOUND)
}

async fn upload_logo(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let business_id = identity.business_id()?.to_owned();

    let mut upload: Option<(Vec<u8>, String, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(format!("Malformed upload: {err}")))?
    {
        if field.name() != Some("logo") {
            continue;
        }
        let content_type = field.content_type().unwrap_or("").to_owned();
        let filename = field.file_name().unwrap_or("logo").to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::Validation(format!("Malformed upload: {err}")))?;
        upload = Some((bytes.to_vec(), filename, content_type));
        break;
    }
    let Some((bytes, filename, content_type)) = upload else {
        return Err(ApiError::Validation("Missing 'logo' file field.".into()));
    };

    if !ALLOWED_LOGO_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::Validation(format!(
            "Invalid file type '{content_type}'. Allowed: jpg, png, webp, svg"
        )));
    }
    if bytes.is_empty() {
        return Err(ApiError::Validation("Uploaded file is empty.".into()));
    }

    let image_host = state
        .image_host
        .as_ref()
        .ok_or_else(|| ApiError::Upstream("image host not configured".into()))?;
    let logo_url = image_host.upload(bytes, &filename, &content_type).await?;

    state
        .store
        .patch_business(&business_id, &json!({ "logo_url": logo_url }))?
        .ok_or(NOT_FOUND)?;

    tracing::info!(%business_id, "logo updated");

    Ok(Json(json!({
        "message": "Logo uploaded successfully.",
        "logo_url": logo_url,
    })))
}
