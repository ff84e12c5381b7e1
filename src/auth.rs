//! Shared-secret gate for manager-only routes.
//!
//! There is one credential for the whole deployment: the token returned by
//! `/api/login`. Any request carrying it in `x-auth-token` is treated as the
//! manager; there are no sessions, expiry or per-user identities.

use crate::errors::AppError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

pub const AUTH_HEADER: &str = "x-auth-token";

/// Extractor that rejects the request with 401 unless the manager token is present.
/// List it before any body extractor so rejected requests never touch the store.
#[derive(Debug, Clone, Copy)]
pub struct ManagerAuth;

#[axum::async_trait]
impl FromRequestParts<AppState> for ManagerAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|value| value.to_str().ok());

        if token == Some(state.config.auth_token.as_str()) {
            Ok(ManagerAuth)
        } else {
            warn!(path = %parts.uri.path(), "rejected request without manager token");
            Err(AppError::unauthorized("Unauthorized. Login as Manager."))
        }
    }
}
