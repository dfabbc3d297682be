#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use chrono::{SubsecRound, Utc};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use vault_api::{AppState, FileVault, JwtService};
use vault_core::{Config, ManualClock, VaultConfig};
use vault_db::FileRepository;
use vault_storage::LocalStorage;

/// Test JWT secret (must match what the helpers sign with).
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

/// Origin the test app builds share URLs from.
pub const TEST_PUBLIC_BASE_URL: &str = "http://vault.test";

/// Returns the prefixed API path: `api_path("/files")` -> `/api/files`.
pub fn api_path(path: &str) -> String {
    format!("{}{}", vault_api::constants::API_PREFIX, path)
}

/// Test application state
pub struct TestApp {
    pub server: TestServer,
    pub clock: ManualClock,
    pub jwt: JwtService,
    pub pool: SqlitePool,
    pub storage_path: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Get the HTTP test client
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Bearer token for `user_id`, valid for an hour.
    pub fn token_for(&self, user_id: &str) -> String {
        auth::token_for(&self.jwt, user_id)
    }

    /// Every published ciphertext blob on disk.
    pub fn stored_blobs(&self) -> Vec<PathBuf> {
        list_files(&self.storage_path.join("uploads"))
    }

    /// Every staged (unpublished) file on disk.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        list_files(&self.storage_path.join(".staging"))
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Setup a test application with an isolated SQLite database and blob directory.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

/// Like [`setup_test_app`] with extra environment-style overrides.
pub async fn setup_test_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_path = temp_dir.path().join("storage");
    let database_url = format!("sqlite://{}", temp_dir.path().join("vault.db").display());

    let mut vars: Vec<(String, String)> = vec![
        ("JWT_SECRET".to_string(), TEST_JWT_SECRET.to_string()),
        ("DATABASE_URL".to_string(), database_url),
        (
            "STORAGE_PATH".to_string(),
            storage_path.display().to_string(),
        ),
        (
            "PUBLIC_BASE_URL".to_string(),
            TEST_PUBLIC_BASE_URL.to_string(),
        ),
    ];
    for (key, value) in overrides {
        vars.push((key.to_string(), value.to_string()));
    }
    let config = Config(Box::new(
        VaultConfig::from_lookup(|key| {
            vars.iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .expect("Failed to build test config"),
    ));
    config.validate().expect("Test config should be valid");

    let pool = vault_db::connect(config.database_url(), 5, Duration::from_secs(5))
        .await
        .expect("Failed to open test database");

    let storage = LocalStorage::new(storage_path.clone())
        .await
        .expect("Failed to create local storage");

    let clock = ManualClock::new(Utc::now().trunc_subsecs(0));
    let jwt = JwtService::new(TEST_JWT_SECRET);

    let state = Arc::new(AppState {
        vault: FileVault::new(
            FileRepository::new(pool.clone()),
            Arc::new(storage),
            Arc::new(clock.clone()),
        ),
        jwt: jwt.clone(),
        public_base_url: config.public_base_url().to_string(),
    });

    let router = vault_api::setup::routes::setup_routes(&config, state)
        .expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        clock,
        jwt,
        pool,
        storage_path,
        _temp_dir: temp_dir,
    }
}
