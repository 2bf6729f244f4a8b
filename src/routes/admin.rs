//! Platform administration. Every handler takes [`AdminIdentity`], so
//! the role check happens before any of this code runs.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::identity::AdminIdentity;
use crate::models::{Role, UserView};
use crate::state::AppState;
use crate::store::SCOPED_COLLECTIONS;

use super::require_id;

const NOT_FOUND: ApiError = ApiError::NotFound("User not found.");

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analytics", get(analytics))
        .route("/users", get(list_users))
        .route("/users/:id", get(fetch_user).delete(remove_user))
}

async fn analytics(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
) -> Result<Json<Value>, ApiError> {
    let mut counts = json!({
        "total_users": state.store.count_users_with_role(Role::User)?,
        "total_businesses": state.store.business_count(),
    });
    if let Some(obj) = counts.as_object_mut() {
        for name in SCOPED_COLLECTIONS {
            obj.insert(
                format!("total_{name}"),
                json!(state.store.collection_count(name)?),
            );
        }
    }
    Ok(Json(counts))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = state.store.list_users()?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

async fn fetch_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    require_id(&id, "user")?;
    state
        .store
        .get_user(&id)?
        .map(|user| Json(UserView::from(&user)))
        .ok_or(NOT_FOUND)
}

/// Deleting a user also purges their business and everything it owns.
async fn remove_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_id(&id, "user")?;
    let user = state.store.get_user(&id)?.ok_or(NOT_FOUND)?;

    if let Some(business_id) = &user.business_id {
        state.store.purge_business(business_id)?;
    }
    state.store.delete_user(&user)?;

    tracing::info!(user_id = %user.id, "user deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}
