//! Storage key generation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

const MAX_NAME_LEN: usize = 100;

/// Marker suffix for encrypted blobs
pub const ENCRYPTED_SUFFIX: &str = ".enc";

/// Key for a new blob: `uploads/{millis}-{file_id}-{name}.enc`.
///
/// The original name is reduced to a filesystem-safe form; the record keeps the
/// unsanitized name.
pub fn generate_storage_key(created_at: DateTime<Utc>, file_id: Uuid, original_name: &str) -> String {
    format!(
        "uploads/{}-{}-{}{}",
        created_at.timestamp_millis(),
        file_id,
        sanitize_name(original_name),
        ENCRYPTED_SUFFIX
    )
}

fn sanitize_name(name: &str) -> String {
    let base = name.rsplit(&['/', '\\'][..]).next().unwrap_or(name);
    let mut cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", "_");
    }
    // No leading dot (hidden file) and no trailing dot, which would run into the suffix.
    let truncated: String = cleaned
        .trim_matches('.')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();
    let trimmed = truncated.trim_end_matches('.');
    if trimmed.is_empty() {
        return "file".to_string();
    }
    trimmed.to_string()
}
