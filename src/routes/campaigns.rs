//! Email campaign drafts with per-campaign analytics counters.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::models::{new_id, Campaign, CampaignAnalytics, CampaignStatus};
use crate::state::AppState;
use crate::store::{patch_field_count, StoreError};

use super::require_id;

const COLLECTION: &str = "campaigns";
const NOT_FOUND: ApiError = ApiError::NotFound("Campaign not found.");

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", collection())
        .route("/:id", get(fetch).patch(update).delete(remove))
}

pub(crate) fn collection() -> MethodRouter<Arc<AppState>> {
    get(list).post(create)
}

#[derive(Deserialize)]
struct CreateCampaign {
    name: String,
    subject: String,
    body: String,
    sender_name: String,
    #[serde(default)]
    reply_to: Option<String>,
    #[serde(default)]
    status: Option<CampaignStatus>,
}

#[derive(Deserialize, Serialize)]
struct CampaignPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<CampaignStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analytics: Option<CampaignAnalytics>,
}

fn check_reply_to(reply_to: &Option<String>) -> Result<(), ApiError> {
    if let Some(addr) = reply_to {
        if !addr.contains('@') || addr.contains(char::is_whitespace) {
            return Err(ApiError::Validation("Invalid reply-to address.".into()));
        }
    }
    Ok(())
}

async fn list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    Ok(Json(scope.list()?))
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Campaign>, ApiError> {
    require_id(&id, "campaign")?;
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    scope.get(&id)?.map(Json).ok_or(NOT_FOUND)
}

async fn create(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CreateCampaign>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let required = [
        ("name", &req.name),
        ("subject", &req.subject),
        ("body", &req.body),
        ("sender_name", &req.sender_name),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!(
                "Missing required field: {field}."
            )));
        }
    }
    check_reply_to(&req.reply_to)?;

    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    let campaign = Campaign {
        id: new_id(),
        business_id: scope.business_id().to_owned(),
        name: req.name,
        subject: req.subject,
        body: req.body,
        sender_name: req.sender_name,
        reply_to: req.reply_to,
        status: req.status.unwrap_or_default(),
        analytics: CampaignAnalytics::default(),
        created_at: Utc::now(),
    };
    scope.insert(&campaign.id, &campaign)?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<CampaignPatch>,
) -> Result<Json<Campaign>, ApiError> {
    require_id(&id, "campaign")?;
    check_reply_to(&req.reply_to)?;
    let patch = serde_json::to_value(&req).map_err(StoreError::from)?;
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
    require_id(&id, "campaign")?;
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    if scope.remove(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(NOT_FOUND)
    }
}
