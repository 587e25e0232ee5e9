use crate::error::NylahError;
use crate::server::router::NylahState;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

fn extract_bearer(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// An admin session issued by `/admin/login` and not yet expired or revoked.
#[derive(Debug, Clone)]
pub struct RequireAdmin {
    pub token: String,
}

impl FromRequestParts<NylahState> for RequireAdmin {
    type Rejection = NylahError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &NylahState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_bearer(&parts.headers) else {
            debug!(path = parts.uri.path(), "[Admin] missing bearer token");
            return Err(NylahError::Unauthorized);
        };

        if state.admin_sessions.validate(&token) {
            Ok(RequireAdmin { token })
        } else {
            debug!(path = parts.uri.path(), "[Admin] unknown or expired session");
            Err(NylahError::Unauthorized)
        }
    }
}
