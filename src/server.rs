//! HTTP front end: the browser UI page plus a small JSON/PNG API.
//!
//! Every request carries the full CSV text and is processed from scratch, so
//! the server keeps no per-user state.

use crate::config::{ChartConfig, ServeConfig};
use crate::csv_reader;
use crate::data::Dataset;
use crate::runtime::{
    self, ChartOutcome, Exploration, InputError, NO_UPLOAD_MESSAGE, UPLOAD_SUCCESS_MESSAGE,
};
use crate::selection::{Selection, SelectionOptions};
use crate::summary::{summarize, Summary};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const INDEX_HTML: &str = include_str!("ui/index.html");

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, err: &anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line
        let message = format!("{:#}", err);
        if status.is_server_error() {
            warn!(code, error = %message, "request failed");
        } else {
            info!(code, error = %message, "request rejected");
        }
        Self {
            code: code.to_string(),
            message,
            status,
        }
    }

    fn invalid_request(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", &anyhow!(rejection.body_text()))
    }

    fn no_upload() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "NO_UPLOAD", &anyhow!(NO_UPLOAD_MESSAGE))
    }

    /// Input problems map to 400, anything else to 500
    fn from_pipeline(err: anyhow::Error) -> Self {
        match err.downcast_ref::<InputError>() {
            Some(InputError::Csv) => Self::invalid_csv(err),
            Some(InputError::Selection) => Self::invalid_selection(err),
            None => Self::render_failed(err),
        }
    }

    fn invalid_csv(err: anyhow::Error) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_CSV", &err)
    }

    fn invalid_selection(err: anyhow::Error) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_SELECTION", &err)
    }

    fn render_failed(err: anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "RENDER_FAILED", &err)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(self);
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<SelectionOptions>,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub csv: String,
    #[serde(default)]
    pub selection: Option<Selection>,
    #[serde(default)]
    pub config: ChartConfig,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartPayload {
    Rendered {
        file_name: String,
        mime: String,
        width: u32,
        height: u32,
        png_base64: String,
    },
    Warning {
        message: String,
    },
}

impl From<&ChartOutcome> for ChartPayload {
    fn from(outcome: &ChartOutcome) -> Self {
        match outcome {
            ChartOutcome::Rendered(chart) => ChartPayload::Rendered {
                file_name: chart.file_name(),
                mime: chart.mime().to_string(),
                width: chart.width_px,
                height: chart.height_px,
                png_base64: STANDARD.encode(&chart.png),
            },
            ChartOutcome::Warning(message) => ChartPayload::Warning {
                message: message.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub summary: Summary,
    pub chart: ChartPayload,
}

pub fn build_router(config: &ServeConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/summary", post(summary_handler))
        .route("/api/render", post(render_handler))
        .route("/api/download", post(download_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
}

/// Bind and serve until the process is stopped
pub async fn serve(config: ServeConfig) -> Result<()> {
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!(address = %address, max_upload_bytes = config.max_upload_bytes, "csv explorer listening");

    axum::serve(listener, build_router(&config))
        .await
        .context("HTTP server stopped unexpectedly")?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

async fn summary_handler(body: Bytes) -> Result<Json<SummaryResponse>, ApiError> {
    if body.is_empty() {
        return Ok(Json(SummaryResponse {
            message: NO_UPLOAD_MESSAGE.to_string(),
            summary: None,
            options: None,
        }));
    }

    let response = run_blocking(move || {
        let dataset = parse_upload(&body)?;
        Ok(SummaryResponse {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            summary: Some(summarize(&dataset)),
            options: Some(SelectionOptions::for_dataset(&dataset)),
        })
    })
    .await?;

    Ok(Json(response))
}

async fn render_handler(
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Json<RenderResponse>, ApiError> {
    let Json(request) = payload.map_err(ApiError::invalid_request)?;
    let (summary, outcome) = run_blocking(move || render_request(request)).await?;
    Ok(Json(RenderResponse {
        summary,
        chart: ChartPayload::from(&outcome),
    }))
}

async fn download_handler(
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(ApiError::invalid_request)?;
    let (_, outcome) = run_blocking(move || render_request(request)).await?;

    let response = match outcome {
        ChartOutcome::Rendered(chart) => (
            [
                (header::CONTENT_TYPE, chart.mime().to_string()),
                (header::CONTENT_DISPOSITION, chart.content_disposition()),
            ],
            chart.png,
        )
            .into_response(),
        ChartOutcome::Warning(message) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ChartPayload::Warning { message }),
        )
            .into_response(),
    };
    Ok(response)
}

fn parse_upload(bytes: &[u8]) -> Result<Dataset, ApiError> {
    csv_reader::read_csv(bytes)
        .context(InputError::Csv)
        .map_err(ApiError::from_pipeline)
}

/// One full explore pass over the request's CSV
fn render_request(request: RenderRequest) -> Result<(Summary, ChartOutcome), ApiError> {
    let exploration = runtime::explore(
        Some(request.csv.as_bytes()),
        request.selection,
        &request.config,
    )
    .map_err(ApiError::from_pipeline)?;

    match exploration {
        Exploration::Ready(outcome) => Ok((outcome.summary, outcome.chart)),
        Exploration::AwaitingUpload { .. } => Err(ApiError::no_upload()),
    }
}

/// Run CPU-bound pipeline work off the async executor
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::render_failed(anyhow::Error::new(e).context("Render task panicked")))?
}
