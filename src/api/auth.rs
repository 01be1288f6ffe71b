//! Request authentication.
//!
//! The authenticated caller is resolved per-handler through an extractor
//! rather than scope middleware, so method dispatch (405) happens before
//! the credential check (401).

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use tracing::{info, trace};

use crate::api::jwt::get_jwt_service;
use crate::errors::FairwayError;

/// The caller identity resolved from a Bearer access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedProfile {
    pub profile_id: String,
}

impl FromRequest for AuthenticatedProfile {
    type Error = FairwayError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve_profile(req))
    }
}

fn resolve_profile(req: &HttpRequest) -> Result<AuthenticatedProfile, FairwayError> {
    let token = extract_bearer_token(req).ok_or_else(|| {
        info!("Authentication failed - missing bearer token");
        FairwayError::unauthenticated("Missing or malformed Authorization header")
    })?;

    let claims = get_jwt_service()
        .validate_access_token(&token)
        .map_err(|e| {
            info!("Authentication failed - token rejected: {}", e);
            FairwayError::unauthenticated(format!("Access token rejected: {}", e))
        })?;

    trace!("Authenticated profile {}", claims.sub);
    Ok(AuthenticatedProfile {
        profile_id: claims.sub,
    })
}

fn extract_bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}
