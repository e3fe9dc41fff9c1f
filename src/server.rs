use crate::config::Config;
use crate::error::DenoiseError;
use crate::evaluation::{self, EvaluationReport, EvaluationSettings, DEFAULT_DENSITIES};
use crate::filter::{Denoiser, WindowSize};
use crate::filters::switching::{self, MedianStrategy};
use crate::filters::{FilterInfo, FilterRegistry};
use crate::noise::NoiseMask;
use crate::preprocessing::Pipeline;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<FilterRegistry>,
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
    pub default_method: String,
    pub available_methods: Vec<FilterInfo>,
    pub default_window_size: u32,
    pub default_densities: Vec<f64>,
    pub max_file_size_bytes: usize,
}

/// Fields shared by the multipart endpoints
#[derive(Default)]
struct UploadForm {
    file: Option<Bytes>,
    window_size: Option<u32>,
    densities: Option<Vec<f64>>,
    seed: Option<u64>,
    strategy: Option<MedianStrategy>,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let max_file_size = config.max_file_size;

    let state = AppState {
        registry: Arc::new(FilterRegistry::new()),
        config: Arc::new(config),
    };

    let app = router(state, max_file_size);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState, max_file_size: usize) -> Router {
    Router::new()
        .route("/restore", post(handle_restore_default))
        .route("/restore/:method", post(handle_restore_with_method))
        .route("/evaluate", post(handle_evaluate))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        // Leave headroom for multipart framing around the file itself
        .layer(DefaultBodyLimit::max(max_file_size + 64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parse the multipart form, validating the file size against the config
async fn read_form(state: &AppState, mut multipart: Multipart) -> Result<UploadForm, DenoiseError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(state, e, "Failed to parse multipart"))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                form.file = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error(state, e, "Failed to read file data"))?,
                );
            }
            "window_size" => {
                let text = field_text(state, field).await?;
                form.window_size = Some(text.trim().parse().map_err(|_| {
                    DenoiseError::InvalidRequest(format!("Invalid window_size: {}", text))
                })?);
            }
            "densities" => {
                let text = field_text(state, field).await?;
                form.densities = Some(parse_densities(&text)?);
            }
            "strategy" => {
                let text = field_text(state, field).await?;
                form.strategy = Some(parse_strategy(&text)?);
            }
            "seed" => {
                let text = field_text(state, field).await?;
                form.seed = Some(text.trim().parse().map_err(|_| {
                    DenoiseError::InvalidRequest(format!("Invalid seed: {}", text))
                })?);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    if let Some(data) = &form.file {
        if data.len() > state.config.max_file_size {
            return Err(DenoiseError::ImageTooLarge {
                size: data.len(),
                max: state.config.max_file_size,
            });
        }
    }

    Ok(form)
}

/// Body-limit rejections surface as multipart errors; keep them a 413
fn multipart_error(state: &AppState, err: MultipartError, context: &str) -> DenoiseError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return DenoiseError::BodyTooLarge {
            max: state.config.max_file_size,
        };
    }
    DenoiseError::InvalidRequest(format!("{}: {}", context, err))
}

fn parse_strategy(text: &str) -> Result<MedianStrategy, DenoiseError> {
    <MedianStrategy as clap::ValueEnum>::from_str(text.trim(), false)
        .map_err(|_| DenoiseError::InvalidRequest(format!("Invalid strategy: {}", text)))
}

async fn field_text(
    state: &AppState,
    field: axum::extract::multipart::Field<'_>,
) -> Result<String, DenoiseError> {
    field
        .text()
        .await
        .map_err(|e| multipart_error(state, e, "Invalid form field"))
}

fn parse_densities(text: &str) -> Result<Vec<f64>, DenoiseError> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| DenoiseError::InvalidRequest(format!("Invalid density: {}", s)))
        })
        .collect()
}

fn window_or_default(state: &AppState, requested: Option<u32>) -> Result<WindowSize, DenoiseError> {
    match requested {
        Some(size) => WindowSize::new(size),
        None => Ok(state.config.default_window_size),
    }
}

/// Run CPU-bound filtering off the async workers
async fn blocking<T, F>(work: F) -> Result<T, DenoiseError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DenoiseError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DenoiseError::Internal(format!("Worker task failed: {}", e)))?
}

/// Handle restore requests using the default filter
async fn handle_restore_default(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, DenoiseError> {
    let filter = state
        .registry
        .default()
        .ok_or_else(|| DenoiseError::Internal("No default filter registered".to_string()))?;
    restore(state, filter, multipart).await
}

/// Handle restore requests with an explicit filter
async fn handle_restore_with_method(
    State(state): State<AppState>,
    Path(method): Path<String>,
    multipart: Multipart,
) -> Result<Response, DenoiseError> {
    let filter = state.registry.require(&method)?;
    restore(state, filter, multipart).await
}

async fn restore(
    state: AppState,
    filter: Arc<dyn Denoiser>,
    multipart: Multipart,
) -> Result<Response, DenoiseError> {
    let start = Instant::now();

    let form = read_form(&state, multipart).await?;
    let data = form.file.ok_or(DenoiseError::MissingFile)?;
    let window = window_or_default(&state, form.window_size)?;
    let filter = switching::with_strategy(filter, form.strategy)?;

    let worker_filter = Arc::clone(&filter);
    let (png, corrupted) = blocking(move || {
        let loaded = Pipeline::native().load_from_memory(&data)?;
        let corrupted = NoiseMask::detect(&loaded.image).count();
        let restored = worker_filter.apply(&loaded.image, window)?;

        let mut png = Vec::new();
        restored
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| DenoiseError::ImageEncode(e.to_string()))?;
        Ok((png, corrupted))
    })
    .await?;

    tracing::info!(
        "Restored image with {} ({}) in {}ms, {} impulse pixels",
        filter.name(),
        window,
        start.elapsed().as_millis(),
        corrupted
    );

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
        (
            HeaderName::from_static("x-denoise-method"),
            HeaderValue::from_static(filter.name()),
        ),
        (
            HeaderName::from_static("x-denoise-window-size"),
            HeaderValue::from(window.get()),
        ),
        (
            HeaderName::from_static("x-denoise-corrupted-pixels"),
            HeaderValue::from(corrupted as u64),
        ),
    ];

    Ok((headers, png).into_response())
}

/// Handle evaluation requests
async fn handle_evaluate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<EvaluationReport>, DenoiseError> {
    let start = Instant::now();

    let form = read_form(&state, multipart).await?;
    let data = form.file.ok_or(DenoiseError::MissingFile)?;
    let settings = EvaluationSettings {
        densities: form
            .densities
            .unwrap_or_else(|| DEFAULT_DENSITIES.to_vec()),
        window: window_or_default(&state, form.window_size)?,
        seed: form.seed.unwrap_or(state.config.default_seed),
        methods: Vec::new(),
    };

    let side = state.config.evaluation_side;
    let registry = Arc::clone(&state.registry);
    let report = blocking(move || {
        let loaded = Pipeline::resized(side, side).load_from_memory(&data)?;
        evaluation::evaluate(&loaded.image, &registry, &settings)
    })
    .await?;

    tracing::info!(
        "Evaluation of {} densities completed in {}ms",
        report.densities.len(),
        start.elapsed().as_millis()
    );

    Ok(Json(report))
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
        default_method: state.registry.default_name().to_string(),
        available_methods: state.registry.info(),
        default_window_size: state.config.default_window_size.get(),
        default_densities: DEFAULT_DENSITIES.to_vec(),
        max_file_size_bytes: state.config.max_file_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_densities_accepts_spaces_and_trailing_comma() {
        assert_eq!(parse_densities("0.1, 0.5,0.9,").unwrap(), vec![0.1, 0.5, 0.9]);
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!(parse_strategy("flagged-only").unwrap(), MedianStrategy::FlaggedOnly);
        assert_eq!(parse_strategy(" full-field ").unwrap(), MedianStrategy::FullField);
        assert!(matches!(
            parse_strategy("fast"),
            Err(DenoiseError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_parse_densities_rejects_garbage() {
        assert!(matches!(
            parse_densities("0.1,lots"),
            Err(DenoiseError::InvalidRequest(_))
        ));
    }
}
