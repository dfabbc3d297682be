use crate::auth::OwnerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use vault_core::FileSummary;

#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    responses(
        (status = 200, description = "The caller's files, newest first", body = Vec<FileSummary>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(owner_id = %owner.owner_id))]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let records = state.vault.list(&owner.requester()).await?;
    let summaries: Vec<FileSummary> = records.iter().map(FileSummary::from).collect();
    Ok(Json(summaries))
}
