//! Shared application state, constructed once at startup and injected
//! into the router. Sled handles and reqwest clients are cheap to clone
//! and thread-safe, so one instance serves every request.

use crate::store::Store;
use crate::token::TokenCodec;
use crate::upstream::{Advisor, ImageHost};

pub struct AppState {
    pub store: Store,
    pub tokens: TokenCodec,
    /// Completion-service collaborator; `None` when not configured.
    pub advisor: Option<Advisor>,
    /// Image-host collaborator; `None` when not configured.
    pub image_host: Option<ImageHost>,
}
