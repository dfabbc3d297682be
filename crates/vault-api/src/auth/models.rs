use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use vault_core::{AppError, OwnerId, Requester};

/// The `user` object inside the token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimsUser {
    pub id: String,
}

/// JWT claims structure: `{ "user": { "id": ... }, "exp": ..., "iat": ... }`
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user: ClaimsUser,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Verified caller, inserted into request extensions by the auth middleware
#[derive(Debug, Clone)]
pub struct OwnerContext {
    pub owner_id: OwnerId,
}

impl OwnerContext {
    pub fn requester(&self) -> Requester {
        Requester::Owner(self.owner_id.clone())
    }
}

// Read from parts so the extractor composes with Multipart.
impl<S> FromRequestParts<S> for OwnerContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OwnerContext>()
            .cloned()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthenticated(
                    "No token, authorization denied".to_string(),
                ))
            })
    }
}
