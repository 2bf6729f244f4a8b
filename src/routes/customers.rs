//! Customer lists. Email is unique per business, not globally.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::models::{new_id, Customer};
use crate::state::AppState;

use super::require_id;

const COLLECTION: &str = "customers";
const NOT_FOUND: ApiError = ApiError::NotFound("Customer not found.");

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", collection())
        .route("/:id", get(fetch).delete(remove))
}

pub(crate) fn collection() -> MethodRouter<Arc<AppState>> {
    get(list).post(create)
}

#[derive(Deserialize)]
struct CreateCustomer {
    name: String,
    email: String,
}

async fn list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    Ok(Json(scope.list()?))
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    require_id(&id, "customer")?;
    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    scope.get(&id)?.map(Json).ok_or(NOT_FOUND)
}

async fn create(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CreateCustomer>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Customer name is required.".into()));
    }
    if !req.email.contains('@') || req.email.contains(char::is_whitespace) {
        return Err(ApiError::Validation("Invalid email address.".into()));
    }

    let scope = state.store.scope(COLLECTION, identity.business_id()?)?;
    // Uniqueness is checked within the scope only, so two businesses can
    // both hold the same address.
    let existing: Vec<Customer> = scope.list()?;
    if existing.iter().any(|customer| customer.email == req.email) {
        return Err(ApiError::Conflict("Customer already exists.".into()));
    }

    let customer = Customer {
        id: new_id(),
        business_id: scope.business_id().to_owned(),
        name: req.name,
        email: req.email,
        created_at: Utc::now(),
    };
    scope.insert(&customer.id, &customer)?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_id(&id, "customer")?;
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
    async fn duplicate_email_conflicts_within_business_only() {
        let state = test_state();
        let app = app(&state);
        let (acme, _) = register(&app, "cu1@acme.test", "Acme").await;
        let (other, _) = register(&app, "cu2@other.test", "Other Co").await;

        let body = json!({ "name": "Jo", "email": "jo@example.com" });

        let (status, _) = send(&app, "POST", "/customers/", Some(&acme), Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, detail) =
            send(&app, "POST", "/customers/", Some(&acme), Some(body.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(detail["detail"], "Customer already exists.");

        // Same address is fine for a different business.
        let (status, _) = send(&app, "POST", "/customers/", Some(&other), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn invalid_email_rejected() {
        let state = test_state();
        let app = app(&state);
        let (token, _) = register(&app, "bademail@acme.test", "Acme").await;

        for email in ["no-at-sign", "has space@example.com"] {
            let (status, _) = send(
                &app,
                "POST",
                "/customers/",
                Some(&token),
                Some(json!({ "name": "Jo", "email": email })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "email: {email}");
        }
    }

    #[tokio::test]
    async fn fetch_and_delete_scoped_to_owner() {
        let state = test_state();
        let app = app(&state);
        let (owner, _) = register(&app, "own@acme.test", "Acme").await;
        let (intruder, _) = register(&app, "intr@other.test", "Other Co").await;

        let (_, customer) = send(
            &app,
            "POST",
            "/customers/",
            Some(&owner),
            Some(json!({ "name": "Jo", "email": "jo@example.com" })),
        )
        .await;
        let path = format!("/customers/{}", customer["id"].as_str().unwrap());

        let (status, _) = send(&app, "GET", &path, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &path, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &path, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
