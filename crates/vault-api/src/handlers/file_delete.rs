use super::MessageResponse;
use crate::auth::OwnerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedPath};
use crate::state::AppState;
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File and ciphertext removed", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "File belongs to another user", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(owner_id = %owner.owner_id, file_id = %id))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.vault.delete(id, &owner.requester()).await?;
    Ok(Json(MessageResponse {
        msg: "File deleted".to_string(),
    }))
}
