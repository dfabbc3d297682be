//! Vault API library
//!
//! HTTP surface of the encrypted file vault: auth, handlers, the upload and download
//! pipelines, and application setup. The binary in `main.rs` only loads configuration
//! and serves the router built here.

pub mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;

pub use auth::JwtService;
pub use error::{ErrorResponse, HttpAppError};
pub use services::{DecryptedDownload, FileSelector, FileVault};
pub use state::AppState;
