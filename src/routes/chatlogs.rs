//! Stored advisor conversations. Written by the chat endpoint; this
//! surface only lists and prunes them.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, MethodRouter};
use axum::{Json, Router};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::models::ChatLog;
use crate::state::AppState;

use super::require_id;

const COLLECTION: &str = "chatlogs";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", collection())
        .route("/:id", delete(remove))
}

pub(crate) fn collection() -> MethodRouter<Arc<AppState>> {
    get(list)
}

async fn list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<ChatLog>>, ApiError> {
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    let mut logs: Vec<ChatLog> = scope.list()?;
    // Newest first.
    logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(Json(logs))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_id(&id, "chatlog")?;
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    if scope.remove(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Chatlog not found."))
    }
}
