use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::Value;

use super::api_path;
use super::auth::bearer;

/// Deterministic, non-repeating-looking content of `len` bytes.
pub fn test_bytes(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9E37_79B9;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xFF) as u8
        })
        .collect()
}

pub fn file_form(file_name: &str, content: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(content)
            .file_name(file_name)
            .mime_type("application/octet-stream"),
    )
}

/// Upload `content` as `file_name`; asserts 201 and returns the `file` object.
pub async fn upload(client: &TestServer, token: &str, file_name: &str, content: Vec<u8>) -> Value {
    let response = client
        .post(&api_path("/files/upload"))
        .add_header("Authorization", bearer(token))
        .multipart(file_form(file_name, content))
        .await;
    assert_eq!(response.status_code(), 201, "upload failed: {}", response.text());
    let body: Value = response.json();
    body["file"].clone()
}

/// Issue a share link; asserts 200 and returns the share token from the URL.
pub async fn share(client: &TestServer, token: &str, file_id: &str) -> String {
    let response = client
        .post(&api_path(&format!("/files/share/{}", file_id)))
        .add_header("Authorization", bearer(token))
        .await;
    assert_eq!(response.status_code(), 200, "share failed: {}", response.text());
    let body: Value = response.json();
    let url = body["shareUrl"].as_str().expect("shareUrl").to_string();
    url.rsplit('/').next().expect("token segment").to_string()
}
