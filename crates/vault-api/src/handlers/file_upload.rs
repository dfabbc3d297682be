use crate::auth::OwnerContext;
use crate::constants::FILE_FIELD;
use crate::error::{multipart_error, ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use vault_core::{AppError, FileRecordResponse};

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub msg: String,
    pub file: FileRecordResponse,
}

#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "Multipart form with a `file` part"),
    responses(
        (status = 201, description = "File encrypted and stored", body = UploadResponse),
        (status = 400, description = "No file part in the request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 413, description = "Upload exceeds the size limit", body = ErrorResponse),
        (status = 500, description = "Storage or database failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(owner_id = %owner.owner_id, operation = "upload_file")
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("The file part has no filename".to_string()))?;

        let record = state
            .vault
            .ingest(&owner.requester(), &original_name, field.map_err(multipart_error))
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                msg: "File uploaded and encrypted successfully".to_string(),
                file: FileRecordResponse::from(&record),
            }),
        ));
    }

    Err(AppError::Validation("No file uploaded".to_string()).into())
}
