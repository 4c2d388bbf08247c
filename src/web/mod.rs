pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{
    image::CONFIDENCE_THRESHOLD,
    lookup::{SummaryLookup, WikipediaClient},
    models::{ClassLabel, ModelRegistry},
    utils::error::ClassifyError,
    Config, Result,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

/// 处理器共享状态，启动时构建一次
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<ModelRegistry>,
    pub lookup: Arc<dyn SummaryLookup>,
}

pub async fn serve(config: Config) -> Result<()> {
    let registry = Arc::new(ModelRegistry::load(&config)?);
    let lookup = WikipediaClient::new(&config.lookup_config)
        .map_err(|e| ClassifyError::Config(format!("Failed to build lookup client: {}", e)))?;

    let state = AppState {
        config: config.clone(),
        registry,
        lookup: Arc::new(lookup),
    };

    let app = create_app(state);

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        ClassifyError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /classify        - JSON base64 upload");
    tracing::info!("  POST /classify/upload - Multipart file upload");
    tracing::info!("  GET  /lookup?q=       - Encyclopedia summary");
    tracing::info!("  GET  /                - Web UI");
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  GET  /api/info        - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ClassifyError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ClassifyError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = state.config.server_config.clone();

    Router::new()
        .route("/classify", post(handlers::classify_json_handler))
        .route("/classify/upload", post(handlers::classify_upload_handler))
        .route("/lookup", get(handlers::lookup_handler))
        .route("/", get(ui::index_handler))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 健康检查端点
async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state.registry.health_check()?;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let classes: Vec<&str> = ClassLabel::ALL.iter().map(|label| label.name()).collect();

    Json(json!({
        "service": "Danio rerio defect classifier",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "models": state.registry.stats(),
        "classes": classes,
        "confidence_threshold": CONFIDENCE_THRESHOLD,
        "lookup": {
            "language": state.config.lookup_config.language,
        }
    }))
}
