use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{convert, download, merge, trim};
use crate::config::{resolve_service_config, ServiceConfig};
use crate::media::artifacts::ArtifactStore;
use crate::media::command::{MediaCommandRunner, StdMediaCommandRunner};
use crate::media::service::ProcessingService;

#[derive(Clone)]
pub struct AppState {
    pub service_name: &'static str,
    pub service_version: &'static str,
    pub started_unix_ms: u128,
    pub config: Arc<ServiceConfig>,
    pub processing: ProcessingService,
    pub artifacts: Arc<ArtifactStore>,
}

impl AppState {
    pub fn new(config: ServiceConfig, runner: Arc<dyn MediaCommandRunner>) -> Self {
        let config = Arc::new(config);
        let artifacts = Arc::new(ArtifactStore::new(config.output_dir.clone()));
        let processing = ProcessingService::new(config.clone(), runner, artifacts.clone());
        Self {
            service_name: "clipforge-backend",
            service_version: env!("CARGO_PKG_VERSION"),
            started_unix_ms: now_unix_ms(),
            config,
            processing,
            artifacts,
        }
    }
}

pub fn build_router() -> Router {
    let data_root = default_data_root();
    let config = resolve_service_config(data_root.as_path());
    build_router_with_config_and_runner(config, Arc::new(StdMediaCommandRunner))
}

pub fn build_router_with_config_and_runner(
    config: ServiceConfig,
    runner: Arc<dyn MediaCommandRunner>,
) -> Router {
    config
        .ensure_directories()
        .expect("upload and output directories should be creatable");
    let max_upload_bytes = config.max_upload_bytes;
    let state = AppState::new(config, runner);

    Router::new()
        .route("/upload", post(convert::convert_video_handler))
        .route("/trim", post(trim::trim_video_handler))
        .route("/merge", post(merge::merge_videos_handler))
        .route("/download/{id}", get(download::download_video_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let app = build_router();
    info!(bind = %addr, "starting clipforge-backend HTTP surface");
    axum::serve(listener, app).await
}

async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": state.service_name,
            "version": state.service_version,
            "started_unix_ms": state.started_unix_ms,
        })),
    )
}

fn default_data_root() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn now_unix_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis())
}
