pub mod file_delete;
pub mod file_download;
pub mod file_list;
pub mod file_share;
pub mod file_upload;

use serde::Serialize;
use utoipa::ToSchema;

/// `{ "msg": ... }` acknowledgement body
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub msg: String,
}
