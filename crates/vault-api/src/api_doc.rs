//! OpenAPI documentation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use vault_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vault API",
        version = "0.1.0",
        description = "Encrypted file vault: files are encrypted with AES-256-CBC at rest and can be shared through expiring links."
    ),
    paths(
        handlers::file_upload::upload_file,
        handlers::file_list::list_files,
        handlers::file_download::download_file,
        handlers::file_download::download_shared_file,
        handlers::file_share::share_file,
        handlers::file_delete::delete_file,
    ),
    components(schemas(
        models::FileRecordResponse,
        models::FileSummary,
        handlers::file_upload::UploadResponse,
        handlers::file_share::ShareLinkResponse,
        handlers::MessageResponse,
        error::ErrorResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "files", description = "Encrypted file storage and sharing")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        for path in [
            "/api/files",
            "/api/files/upload",
            "/api/files/download/{id}",
            "/api/files/download/shared/{token}",
            "/api/files/share/{id}",
            "/api/files/{id}",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {}", path);
        }
        assert!(spec
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
