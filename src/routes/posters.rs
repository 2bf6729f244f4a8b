//! Generated marketing posters. Records are immutable once created;
//! the surface is create, list, fetch and delete only.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::models::{new_id, Poster};
use crate::state::AppState;

use super::require_id;

const COLLECTION: &str = "posters";
const NOT_FOUND: ApiError = ApiError::NotFound("Poster not found.");

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", collection())
        .route("/:id", get(fetch).delete(remove))
}

pub(crate) fn collection() -> MethodRouter<Arc<AppState>> {
    get(list).post(create)
}

#[derive(Deserialize)]
struct CreatePoster {
    title: String,
    #[serde(default)]
    prompt_used: Option<String>,
    image_url: String,
}

async fn list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Poster>>, ApiError> {
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    Ok(Json(scope.list()?))
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Poster>, ApiError> {
    require_id(&id, "poster")?;
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    scope.get(&id)?.map(Json).ok_or(NOT_FOUND)
}

async fn create(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CreatePoster>,
) -> Result<(StatusCode, Json<Poster>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("Poster title is required.".into()));
    }
    if req.image_url.trim().is_empty() {
        return Err(ApiError::Validation("Image URL is required.".into()));
    }

    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    let poster = Poster {
        id: new_id(),
        business_id: scope.business_id().to_owned(),
        title: req.title,
        prompt_used: req.prompt_used,
        image_url: req.image_url,
        created_at: Utc::now(),
    };
    scope.insert(&poster.id, &poster)?;
    Ok((StatusCode::CREATED, Json(poster)))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_id(&id, "poster")?;
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
    async fn create_list_and_delete() {
        let state = test_state();
        let app = app(&state);
        let (token, business_id) = register(&app, "poster@acme.test", "Acme").await;

        let (status, poster) = send(
            &app,
            "POST",
            "/posters/",
            Some(&token),
            Some(json!({
                "title": "Summer Launch",
                "prompt_used": "bold typography, warm palette",
                "image_url": "https://img.example/posters/1.png",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(poster["business_id"], business_id);

        let (_, listed) = send(&app, "GET", "/posters/", Some(&token), None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let path = format!("/posters/{}", poster["id"].as_str().unwrap());
        let (status, _) = send(&app, "DELETE", &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_image_url_rejected() {
        let state = test_state();
        let app = app(&state);
        let (token, _) = register(&app, "noimg@acme.test", "Acme").await;

        let (status, _) = send(
            &app,
            "POST",
            "/posters/",
            Some(&token),
            Some(json!({ "title": "No image", "image_url": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn posters_have_no_patch_route() {
        let state = test_state();
        let app = app(&state);
        let (token, _) = register(&app, "nopatch@acme.test", "Acme").await;

        let (_, poster) = send(
            &app,
            "POST",
            "/posters/",
            Some(&token),
            Some(json!({ "title": "Fixed", "image_url": "https://img.example/p.png" })),
        )
        .await;
        let path = format!("/posters/{}", poster["id"].as_str().unwrap());

        let (status, _) = send(
            &app,
            "PATCH",
            &path,
            Some(&token),
            Some(json!({ "title": "edited" })),
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn cross_tenant_poster_is_not_found() {
        let state = test_state();
        let app = app(&state);
        let (owner, _) = register(&app, "p1@acme.test", "Acme").await;
        let (intruder, _) = register(&app, "p2@other.test", "Other Co").await;

        let (_, poster) = send(
            &app,
            "POST",
            "/posters/",
            Some(&owner),
            Some(json!({ "title": "Private", "image_url": "https://img.example/p.png" })),
        )
        .await;
        let path = format!("/posters/{}", poster["id"].as_str().unwrap());

        let (status, _) = send(&app, "GET", &path, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
