use crate::auth::OwnerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedPath};
use crate::services::share::share_url;
use crate::state::AppState;
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use vault_core::AppError;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkResponse {
    pub share_url: String,
    pub expires_at: DateTime<Utc>,
}

#[utoipa::path(
    post,
    path = "/api/files/share/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "Fresh share link; earlier links stop working", body = ShareLinkResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "File belongs to another user", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(owner_id = %owner.owner_id, file_id = %id))]
pub async fn share_file(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state.vault.issue_share(id, &owner.requester()).await?;

    let (token, expires_at) = match (record.share.token(), record.share.expires_at()) {
        (Some(token), Some(expires_at)) => (token, expires_at),
        _ => return Err(AppError::Internal("Share state missing after issue".to_string()).into()),
    };

    Ok(Json(ShareLinkResponse {
        share_url: share_url(&state.public_base_url, token),
        expires_at,
    }))
}
