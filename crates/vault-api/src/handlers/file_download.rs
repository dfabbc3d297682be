use crate::auth::OwnerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedPath};
use crate::services::{DecryptedDownload, FileSelector};
use crate::state::AppState;
use crate::utils::content_disposition;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;
use vault_core::{AppError, Requester};

fn stream_response(download: DecryptedDownload) -> Result<Response, HttpAppError> {
    let DecryptedDownload { record, body } = download;
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, record.size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition::attachment(&record.original_name),
        )
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from_stream(body))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)).into())
}

#[utoipa::path(
    get,
    path = "/api/files/download/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "Decrypted file", content_type = "application/octet-stream"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "File belongs to another user", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(owner_id = %owner.owner_id, file_id = %id, operation = "download_file")
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let download = state
        .vault
        .fetch(FileSelector::Id(id), &owner.requester())
        .await?;
    stream_response(download)
}

#[utoipa::path(
    get,
    path = "/api/files/download/shared/{token}",
    tag = "files",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Decrypted file", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown or revoked link", body = ErrorResponse),
        (status = 410, description = "Link has expired", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(operation = "download_shared_file"))]
pub async fn download_shared_file(
    State(state): State<Arc<AppState>>,
    ValidatedPath(token): ValidatedPath<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let download = state
        .vault
        .fetch(FileSelector::ShareToken(token), &Requester::Anonymous)
        .await?;
    stream_response(download)
}
