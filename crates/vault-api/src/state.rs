//! Application state shared by all handlers.

use crate::auth::JwtService;
use crate::services::FileVault;

#[derive(Clone)]
pub struct AppState {
    pub vault: FileVault,
    pub jwt: JwtService,
    /// Origin prefixed to share URLs
    pub public_base_url: String,
}
