use crate::config::Config;
use crate::error::PreprocessError;
use crate::transforms::{TransformInfo, TransformRegistry};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use image::ImageFormat;
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries, part headers and the `transform` field on
/// top of the file itself, so an oversized file reaches the handler's check
const MULTIPART_HEADROOM: usize = 64 * 1024;

const PROCESSING_TIME_HEADER: HeaderName = HeaderName::from_static("x-processing-time-ms");
const TRANSFORM_HEADER: HeaderName = HeaderName::from_static("x-transform");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TransformRegistry>,
    pub config: Arc<Config>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub default_transform: String,
    pub available_transforms: Vec<TransformInfo>,
    pub max_file_size_bytes: usize,
}

/// Build the router over an existing registry
pub fn router(config: Config, registry: TransformRegistry) -> Router {
    let max_file_size = config.max_file_size;

    let state = AppState {
        registry: Arc::new(registry),
        config: Arc::new(config),
    };

    Router::new()
        .route("/preprocess", post(handle_preprocess))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_file_size.saturating_add(MULTIPART_HEADROOM))),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let registry = TransformRegistry::with_builtins();
    if registry.get(&config.default_transform).is_none() {
        anyhow::bail!("default transform '{}' is not registered", config.default_transform);
    }

    let addr = config.addr();
    let app = router(config, registry);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle preprocess requests: multipart `file` plus optional `transform`
async fn handle_preprocess(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, PreprocessError> {
    let start = Instant::now();
    let max_file_size = state.config.max_file_size;

    let mut file_data: Option<Bytes> = None;
    let mut transform_name: Option<String> = None;

    // Parse multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to parse multipart", max_file_size))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error(e, "Failed to read file data", max_file_size))?,
                );
            }
            "transform" => {
                transform_name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, "Invalid transform", max_file_size))?,
                );
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or(PreprocessError::MissingFile)?;

    if data.len() > max_file_size {
        return Err(PreprocessError::ImageTooLarge {
            size: Some(data.len()),
            max: max_file_size,
        });
    }

    let transform_name = transform_name
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| state.config.default_transform.clone());
    let transform = state.registry.resolve(&transform_name)?;

    // Decoding and the pixel work are CPU-bound
    let output = tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&data)
            .map_err(|e| PreprocessError::DecodeFailed(e.to_string()))?;
        let output = transform.apply(image)?;

        let mut png = Vec::new();
        output
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PreprocessError::Internal(format!("Failed to encode PNG: {}", e)))?;
        Ok::<_, PreprocessError>(png)
    })
    .await
    .map_err(|e| PreprocessError::Internal(format!("Worker task failed: {}", e)))??;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Applied '{}' in {}ms, {} bytes out",
        transform_name,
        processing_time_ms,
        output.len()
    );

    let transform_header = HeaderValue::from_str(&transform_name)
        .map_err(|e| PreprocessError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (PROCESSING_TIME_HEADER, HeaderValue::from(processing_time_ms)),
            (TRANSFORM_HEADER, transform_header),
        ],
        output,
    )
        .into_response())
}

/// Body-limit overruns become `ImageTooLarge`; everything else is a bad request
fn multipart_error(err: MultipartError, context: &str, max_file_size: usize) -> PreprocessError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PreprocessError::ImageTooLarge {
            size: None,
            max: max_file_size,
        }
    } else {
        PreprocessError::InvalidRequest(format!("{}: {}", context, err.body_text()))
    }
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        default_transform: state.config.default_transform.clone(),
        available_transforms: state.registry.info(),
        max_file_size_bytes: state.config.max_file_size,
    })
}
