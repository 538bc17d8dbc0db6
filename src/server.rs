use crate::annotate;
use crate::config::Config;
use crate::document::{self, Pages};
use crate::engines::{EngineInfo, EngineRegistry};
use crate::error::OcrError;
use crate::segmentation::{
    BoundingBox, ImageInput, LineSegmenter, SegmentationParams, StepTiming,
};
use crate::transcribe::{TranscribedLine, Transcriber};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engines: Arc<EngineRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(engines: EngineRegistry, config: Config) -> Self {
        Self {
            engines: Arc::new(engines),
            config: Arc::new(config),
        }
    }
}

/// OCR response
#[derive(Serialize)]
pub struct OcrResponse {
    pub text: String,
    pub lines: Vec<TranscribedLine>,
    pub engine: String,
    pub processing_time_ms: u64,
    pub warnings: Vec<String>,
}

/// Segmentation of one page
#[derive(Serialize)]
pub struct PageSegments {
    pub page: usize,
    pub lines: Vec<BoundingBox>,
    pub steps: Vec<StepTiming>,
}

/// Segmentation-only response
#[derive(Serialize)]
pub struct SegmentResponse {
    pub pages: Vec<PageSegments>,
    pub processing_time_ms: u64,
    pub warnings: Vec<String>,
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
    pub default_engine: String,
    pub available_engines: Vec<EngineInfo>,
    pub max_file_size_bytes: usize,
    pub default_language: String,
    pub max_tokens: usize,
    pub segmentation: SegmentationParams,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let engines = EngineRegistry::new(&config)?;
    let addr = format!("{}:{}", config.host, config.port);

    let app = router(AppState::new(engines, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/ocr", post(handle_ocr))
        .route("/ocr/:engine", post(handle_ocr_with_engine))
        .route("/segment", post(handle_segment))
        .route("/annotate", post(handle_annotate))
        .route("/projection", post(handle_projection))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A parsed multipart upload
struct Upload {
    data: Bytes,
    content_type: String,
    params: SegmentationParams,
}

/// Read the file and optional segmentation overrides from a multipart form
async fn read_upload(state: &AppState, mut multipart: Multipart) -> Result<Upload, OcrError> {
    let mut file_data: Option<Bytes> = None;
    let mut content_type: Option<String> = None;
    let mut params = state.config.segmentation.clone();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OcrError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" | "image" => {
                content_type = field.content_type().map(|s| s.to_string());
                file_data = Some(field.bytes().await.map_err(|e| {
                    OcrError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?);
            }
            "height_ratio_threshold" => {
                params.height_ratio_threshold = parse_field(&name, field).await?
            }
            "sigma" => params.sigma = parse_field(&name, field).await?,
            "activity_fraction" => params.activity_fraction = parse_field(&name, field).await?,
            "min_padding" => params.min_padding = parse_field(&name, field).await?,
            _ => {
                // Ignore unknown fields
            }
        }
    }

    params
        .validate()
        .map_err(|e| OcrError::InvalidRequest(e.to_string()))?;

    let data = file_data.ok_or(OcrError::MissingFile)?;

    if data.len() > state.config.max_file_size {
        return Err(OcrError::ImageTooLarge {
            size: data.len(),
            max: state.config.max_file_size,
        });
    }

    Ok(Upload {
        data,
        content_type: content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        params,
    })
}

async fn parse_field<T: std::str::FromStr>(
    name: &str,
    field: axum::extract::multipart::Field<'_>,
) -> Result<T, OcrError> {
    let text = field
        .text()
        .await
        .map_err(|e| OcrError::InvalidRequest(format!("Invalid {}: {}", name, e)))?;
    text.trim()
        .parse()
        .map_err(|_| OcrError::InvalidRequest(format!("Invalid {}: {:?}", name, text)))
}

/// Write the upload to a temp file whose extension matches its MIME type
fn persist(upload: &Upload) -> Result<NamedTempFile, OcrError> {
    let extension = match upload.content_type.as_str() {
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "image/webp" => ".webp",
        "image/tiff" => ".tiff",
        "application/pdf" => ".pdf",
        _ => ".tmp",
    };

    let mut temp_file = tempfile::Builder::new()
        .suffix(extension)
        .tempfile()
        .map_err(|e| OcrError::Internal(format!("Failed to create temp file: {}", e)))?;

    temp_file
        .write_all(&upload.data)
        .map_err(|e| OcrError::Internal(format!("Failed to write temp file: {}", e)))?;

    Ok(temp_file)
}

/// Run CPU-bound work off the async runtime
async fn blocking<T, F>(work: F) -> Result<T, OcrError>
where
    F: FnOnce() -> Result<T, OcrError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| OcrError::Internal(format!("Worker task failed: {}", e)))?
}

/// Handle OCR requests with the default engine
async fn handle_ocr(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, OcrError> {
    let engine = state.engines.default_name().to_string();
    ocr_with(state, engine, multipart).await
}

/// Handle OCR requests with an explicitly chosen engine
async fn handle_ocr_with_engine(
    State(state): State<AppState>,
    Path(engine): Path<String>,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, OcrError> {
    ocr_with(state, engine, multipart).await
}

async fn ocr_with(
    state: AppState,
    engine_name: String,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, OcrError> {
    let start = Instant::now();

    let engine = state
        .engines
        .get(&engine_name)
        .ok_or_else(|| OcrError::EngineNotFound(engine_name.clone()))?;

    let upload = read_upload(&state, multipart).await?;
    let temp_file = persist(&upload)?;
    let transcriber = Transcriber::new(
        LineSegmenter::new(upload.params),
        engine,
        state.config.max_tokens,
    );

    let transcript = blocking(move || {
        let Pages {
            pages,
            mut warnings,
        } = document::load_pages(temp_file.path())?;
        let mut transcript = transcriber.transcribe_pages(pages);
        warnings.append(&mut transcript.warnings);
        transcript.warnings = warnings;
        Ok(transcript)
    })
    .await?;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "OCR completed in {}ms with {}: {} line(s), text length: {}",
        processing_time_ms,
        engine_name,
        transcript.lines.len(),
        transcript.text.len()
    );

    Ok(Json(OcrResponse {
        text: transcript.text,
        lines: transcript.lines,
        engine: engine_name,
        processing_time_ms,
        warnings: transcript.warnings,
    }))
}

/// Handle segmentation-only requests
async fn handle_segment(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SegmentResponse>, OcrError> {
    let start = Instant::now();

    let upload = read_upload(&state, multipart).await?;
    let temp_file = persist(&upload)?;
    let segmenter = LineSegmenter::new(upload.params);

    let (pages, warnings) = blocking(move || {
        let Pages {
            pages,
            mut warnings,
        } = document::load_pages(temp_file.path())?;

        let mut segmented = Vec::new();
        for (page, input) in pages.into_iter().enumerate() {
            match input.load() {
                Ok(image) => {
                    let result = segmenter.segment_image(&image, None);
                    segmented.push(PageSegments {
                        page,
                        lines: result.lines.iter().map(|line| line.bbox).collect(),
                        steps: result.steps,
                    });
                }
                Err(e) => {
                    tracing::warn!("Page {}: {}", page, e);
                    warnings.push(format!("Page {}: {}", page, e));
                }
            }
        }
        Ok((segmented, warnings))
    })
    .await?;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Segmentation completed in {}ms: {} page(s)",
        processing_time_ms,
        pages.len()
    );

    Ok(Json(SegmentResponse {
        pages,
        processing_time_ms,
        warnings,
    }))
}

/// First page of an upload, decoded
fn first_page(temp_file: &NamedTempFile) -> Result<image::DynamicImage, OcrError> {
    document::load_pages(temp_file.path())?
        .pages
        .into_iter()
        .next()
        .ok_or_else(|| OcrError::UnsupportedFormat("No page image found".to_string()))
        .and_then(ImageInput::load)
}

fn png_response(png: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], png).into_response()
}

/// Return the first page with every detected line outlined
async fn handle_annotate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, OcrError> {
    let upload = read_upload(&state, multipart).await?;
    let temp_file = persist(&upload)?;
    let segmenter = LineSegmenter::new(upload.params);

    let png = blocking(move || {
        let image = first_page(&temp_file)?;
        let result = segmenter.segment_image(&image, None);
        let boxes: Vec<BoundingBox> = result.lines.iter().map(|line| line.bbox).collect();
        annotate::encode_png(&annotate::draw_line_boxes(&image, &boxes))
    })
    .await?;

    Ok(png_response(png))
}

/// Return the projection profile plot of the first page
async fn handle_projection(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, OcrError> {
    if !state.config.segmentation.plot_projection {
        return Err(OcrError::InvalidRequest(
            "Projection plots are disabled on this server".to_string(),
        ));
    }

    let upload = read_upload(&state, multipart).await?;
    let temp_file = persist(&upload)?;
    let segmenter = LineSegmenter::new(SegmentationParams {
        plot_projection: true,
        ..upload.params
    });

    let png = blocking(move || {
        let image = first_page(&temp_file)?;

        // Unique per request; removed when dropped
        let plot_file = tempfile::Builder::new()
            .prefix("projection-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Internal(format!("Failed to create temp file: {}", e)))?;

        segmenter.segment_image(&image, Some(plot_file.path()));

        let png = std::fs::read(plot_file.path())
            .map_err(|e| OcrError::PlotError(format!("Failed to read plot: {}", e)))?;
        if png.is_empty() {
            return Err(OcrError::PlotError("Plot was not written".to_string()));
        }
        Ok(png)
    })
    .await?;

    Ok(png_response(png))
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
        default_engine: state.engines.default_name().to_string(),
        available_engines: state.engines.info(),
        max_file_size_bytes: state.config.max_file_size,
        default_language: state.config.default_language.clone(),
        max_tokens: state.config.max_tokens,
        segmentation: state.config.segmentation.clone(),
    })
}
