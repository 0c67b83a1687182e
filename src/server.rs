//! HTTP gateway using axum

use crate::engine::DoclingCli;
use crate::error::Error;
use crate::extract::{DoclingExtractor, ResultEnvelope};
use crate::upload::{validate_upload, FileInfo, ModelKind, DEFAULT_MAX_UPLOAD_BYTES};
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

/// Room left on top of the upload ceiling for multipart framing
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

const SERVICE_NAME: &str = "pdf-extraction-api";

/// Service and engine configuration for the gateway
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub addr: String,
    /// Maximum accepted PDF size in bytes (default: 50MB)
    pub max_upload_bytes: u64,
    /// Upper bound for one extraction request (default: 300s)
    pub extract_timeout: Duration,
    /// Docling executable (default: `docling` on PATH)
    pub docling_bin: PathBuf,
    /// Extra arguments passed to every Docling conversion
    pub docling_args: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            extract_timeout: Duration::from_secs(300),
            docling_bin: PathBuf::from("docling"),
            docling_args: Vec::new(),
        }
    }
}

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    extractor: Arc<DoclingExtractor>,
    config: Arc<ServerConfig>,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
    pub models_available: Vec<ModelKind>,
    pub primary_engine: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub file_info: FileInfo,
    pub next_steps: &'static str,
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Gateway error carrying the status code it maps to
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::warn!(error = %self.0, "request rejected");
        }
        let body = ErrorBody {
            detail: self.0.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Multipart form
// ============================================================================

/// Fields of an upload form
struct UploadForm {
    filename: String,
    data: Bytes,
    model: String,
}

async fn read_form(
    mut multipart: Multipart,
    max_upload_bytes: u64,
) -> crate::error::Result<UploadForm> {
    let mut file: Option<(String, Bytes)> = None;
    let mut model = ModelKind::Docling.as_str().to_string();

    let map_err = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Error::FileTooLarge {
                size: max_upload_bytes + MULTIPART_OVERHEAD_BYTES as u64,
                max_size: max_upload_bytes,
            }
        } else {
            Error::InvalidUpload {
                reason: e.body_text(),
            }
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(map_err)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(map_err)?;
                file = Some((filename, data));
            }
            Some("model") => {
                let value = field.text().await.map_err(map_err)?;
                let value = value.trim();
                if !value.is_empty() {
                    model = value.to_string();
                }
            }
            _ => {}
        }
    }

    let (filename, data) = file.ok_or_else(|| Error::InvalidUpload {
        reason: "missing 'file' field".to_string(),
    })?;

    Ok(UploadForm {
        filename,
        data,
        model,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// API health check
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "healthy",
        message: "PDF Extraction Playground API",
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Detailed health check, including whether the primary engine is usable
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        timestamp: chrono::Utc::now().to_rfc3339(),
        models_available: ModelKind::ALL.to_vec(),
        primary_engine: if state.extractor.primary_available() {
            "available"
        } else {
            "unavailable"
        },
    })
}

/// Model catalog
async fn list_models(State(state): State<AppState>) -> Json<Value> {
    let mut models = Map::new();
    for kind in ModelKind::ALL {
        let status = match kind {
            ModelKind::Docling if state.extractor.primary_available() => "available",
            ModelKind::Docling => "fallback_only",
            _ => "not_implemented",
        };
        let mut entry = serde_json::to_value(kind.info()).unwrap_or_default();
        if let Value::Object(obj) = &mut entry {
            obj.insert("status".to_string(), Value::from(status));
        }
        models.insert(kind.as_str().to_string(), entry);
    }
    Json(json!({ "models": models }))
}

/// Validate an upload without extracting it
async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_form(multipart, state.config.max_upload_bytes).await?;
    let size = form.data.len() as u64;
    let model = validate_upload(&form.filename, size, &form.model, state.config.max_upload_bytes)?;

    tracing::info!(
        filename = %form.filename,
        size_kb = size as f64 / 1024.0,
        model = %model,
        "Received PDF"
    );

    Ok(Json(UploadResponse {
        status: "success",
        message: "PDF uploaded and validated successfully",
        file_info: FileInfo::new(form.filename, size, model),
        next_steps: "File ready for extraction. Call /extract endpoint.",
    }))
}

/// Validate an upload and run extraction on it
async fn extract_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ResultEnvelope>, ApiError> {
    let form = read_form(multipart, state.config.max_upload_bytes).await?;
    let size = form.data.len() as u64;
    let model = validate_upload(&form.filename, size, &form.model, state.config.max_upload_bytes)?
        .ensure_implemented()?;

    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, filename = %form.filename, size, model = %model, "Starting extraction");

    // Engine work blocks; keep it off the async workers
    let extractor = state.extractor.clone();
    let UploadForm { filename, data, .. } = form;
    let task = tokio::task::spawn_blocking(move || extractor.extract(&data, &filename));

    let timeout = state.config.extract_timeout;
    let envelope = tokio::time::timeout(timeout, task)
        .await
        .map_err(|_| Error::Timeout {
            seconds: timeout.as_secs(),
        })?
        .map_err(|e| Error::EngineFailed {
            reason: format!("Task join error: {}", e),
        })?;

    tracing::info!(
        %request_id,
        status = ?envelope.status,
        model = %envelope.model,
        processing_time_ms = envelope.processing_time_ms,
        "Extraction finished"
    );

    Ok(Json(envelope))
}

// ============================================================================
// Router and entry points
// ============================================================================

/// Build the router around an extractor
pub fn create_router(extractor: DoclingExtractor, config: ServerConfig) -> Router {
    let body_limit = config.max_upload_bytes as usize + MULTIPART_OVERHEAD_BYTES;
    let state = AppState {
        extractor: Arc::new(extractor),
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/models", get(list_models))
        .route("/upload", post(upload_pdf))
        .route("/extract", post(extract_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build an extractor, probing the Docling engine once
pub fn build_extractor(config: &ServerConfig) -> DoclingExtractor {
    match DoclingCli::detect(&config.docling_bin, config.docling_args.clone()) {
        Ok(engine) => DoclingExtractor::with_engine(engine),
        Err(e) => {
            tracing::warn!(error = %e, "Docling not available, serving plain-text fallback only");
            DoclingExtractor::fallback_only()
        }
    }
}

/// Run the gateway with default configuration
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the gateway with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    let extractor = build_extractor(&config);
    let addr = config.addr.clone();
    let app = create_router(extractor, config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "PDF extraction gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
