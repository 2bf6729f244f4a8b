//! Identity resolution for protected routes.
//!
//! [`Identity`] turns a bearer token into the current user record.
//! The token is trusted for its subject only: the user is re-read from the
//! store on every request, so role or business changes take effect
//! immediately without token reissuance, at the cost of one lookup.
//! [`AdminIdentity`] composes authentication with the admin role check;
//! it is never a substitute for it.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::{ApiError, BAD_TOKEN};
use crate::models::{Role, User};
use crate::state::AppState;

pub struct Identity(pub User);

pub struct AdminIdentity(pub User);

impl Identity {
    /// The caller's business id, or 404 for the rare account without one.
    pub fn business_id(&self) -> Result<&str, ApiError> {
        self.0
            .business_id
            .as_deref()
            .ok_or(ApiError::NotFound("No business linked to this account."))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized(BAD_TOKEN))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized(BAD_TOKEN))?;

        let claims = state.tokens.decode(token).map_err(|err| {
            tracing::debug!(%err, "bearer token rejected");
            ApiError::Unauthorized(BAD_TOKEN)
        })?;

        let user = state
            .store
            .get_user(&claims.sub)?
            .ok_or(ApiError::Unauthorized(BAD_TOKEN))?;

        Ok(Identity(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Identity(user) = Identity::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(ApiError::Forbidden);
        }
        Ok(AdminIdentity(user))
    }
}
