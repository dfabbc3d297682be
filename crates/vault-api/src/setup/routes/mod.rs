//! Route configuration and setup.

mod health;

use crate::api_doc::ApiDoc;
use crate::auth::{auth_middleware, AuthState};
use crate::constants::API_PREFIX;
use crate::handlers::{file_delete, file_download, file_list, file_share, file_upload};
use crate::middleware::{request_id_middleware, security_headers_middleware, RequestId};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, Request},
    routing::{delete, get, post},
    Json, Router,
};
use std::borrow::Cow;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa::OpenApi;
use vault_core::Config;

const SHARED_DOWNLOAD_PREFIX: &str = "/api/files/download/shared/";

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        jwt: state.jwt.clone(),
    });

    let protected_routes = protected_routes().route_layer(
        axum::middleware::from_fn_with_state(auth_state, auth_middleware),
    );
    let app_state_routes = public_routes().merge(protected_routes);

    let trace_layer = TraceLayer::new_for_http().make_span_with(make_request_span);

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit(),
        max_upload_size_bytes = config.max_upload_size_bytes(),
        "HTTP limits configured"
    );

    let app = app_state_routes
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit()))
        .layer(RequestBodyLimitLayer::new(config.max_upload_size_bytes()))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(trace_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state);

    Ok(app)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route(
            &format!("{}/files/download/shared/{{token}}", API_PREFIX),
            get(file_download::download_shared_file),
        )
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(&format!("{}/files", API_PREFIX), get(file_list::list_files))
        .route(
            &format!("{}/files/upload", API_PREFIX),
            post(file_upload::upload_file),
        )
        .route(
            &format!("{}/files/download/{{id}}", API_PREFIX),
            get(file_download::download_file),
        )
        .route(
            &format!("{}/files/share/{{id}}", API_PREFIX),
            post(file_share::share_file),
        )
        .route(
            &format!("{}/files/{{id}}", API_PREFIX),
            delete(file_delete::delete_file),
        )
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.as_str())
        .unwrap_or("-");
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %loggable_path(request.uri().path()),
        request_id = %request_id,
    )
}

/// Share tokens are bearer secrets; keep them out of the logs.
fn loggable_path(path: &str) -> Cow<'_, str> {
    match path.strip_prefix(SHARED_DOWNLOAD_PREFIX) {
        Some(token) if !token.is_empty() => Cow::Owned(format!("{}<redacted>", SHARED_DOWNLOAD_PREFIX)),
        _ => Cow::Borrowed(path),
    }
}
