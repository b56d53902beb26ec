//! Authentication middleware.
//!
//! Credential issuance and validation belong to the external auth
//! service; this extractor only pulls the bearer token out of the request
//! and uses its opaque subject as the owner key for every row the caller
//! touches.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};

use crate::AppState;

/// The authenticated owner of the collection being accessed.
#[derive(Debug, Clone)]
pub struct AuthOwner {
    /// Owner key derived from the bearer credential
    pub owner_id: String,
}

impl FromRequestParts<AppState> for AuthOwner {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match auth_header {
            Some(header) if header.starts_with("Bearer ") => {
                let token = header.trim_start_matches("Bearer ").to_string();

                if token.is_empty() {
                    return Err((StatusCode::UNAUTHORIZED, "Empty bearer token"));
                }

                Ok(AuthOwner { owner_id: token })
            }
            Some(_) => Err((
                StatusCode::UNAUTHORIZED,
                "Invalid authorization header format",
            )),
            None => {
                // Anonymous access only exists when no auth secret is
                // configured (development mode).
                if state.config.auth_secret.is_none() {
                    Ok(AuthOwner {
                        owner_id: "anonymous".to_string(),
                    })
                } else {
                    Err((StatusCode::UNAUTHORIZED, "Missing authorization header"))
                }
            }
        }
    }
}
