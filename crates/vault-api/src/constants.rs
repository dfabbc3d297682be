/// Prefix for all file routes
pub const API_PREFIX: &str = "/api";

/// Multipart part that carries the uploaded file
pub const FILE_FIELD: &str = "file";

/// Response header carrying the per-request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";
