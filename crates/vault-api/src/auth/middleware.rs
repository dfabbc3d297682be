use crate::auth::jwt::JwtService;
use crate::auth::models::OwnerContext;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use vault_core::AppError;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtService,
}

/// Require `Authorization: Bearer <jwt>` and attach the verified [`OwnerContext`].
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        Some(token) => token,
        None => {
            return HttpAppError(AppError::Unauthenticated(
                "No token, authorization denied".to_string(),
            ))
            .into_response();
        }
    };

    let owner_id = match auth_state.jwt.verify(token) {
        Ok(owner_id) => owner_id,
        Err(err) => return HttpAppError(err).into_response(),
    };

    request.extensions_mut().insert(OwnerContext { owner_id });
    next.run(request).await
}
