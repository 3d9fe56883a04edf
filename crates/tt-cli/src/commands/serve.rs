//! HTTP API server using axum

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tt_core::DatasetSummary;
use tt_pipeline::{
    ChatRequest, ChatResponse, DatasetStatus, Pipeline, PipelineError, Suggestions,
    UploadResponse,
};

use crate::cli::{GlobalArgs, ServeArgs};
use crate::context::RuntimeContext;

/// Multipart field carrying the uploaded CSV
const UPLOAD_FIELD: &str = "file";

/// Execute the serve command
pub(crate) async fn execute(args: &ServeArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let host = args
        .host
        .clone()
        .unwrap_or_else(|| ctx.config.server.host.clone());
    let port = args.port.unwrap_or(ctx.config.server.port);

    let pipeline = Arc::new(ctx.pipeline());
    let app = router(pipeline, ctx.config.server.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}:{}", host, port))?;
    log::info!("Serving TableTalk API at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Build the API router
pub(crate) fn router(pipeline: Arc<Pipeline>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/datasets", post(upload_dataset).get(list_datasets))
        .route("/api/datasets/{id}", get(dataset_status))
        .route(
            "/api/datasets/{id}/suggest-questions",
            post(suggest_questions),
        )
        .route("/api/chat", post(chat))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(pipeline)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("Could not listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

/// JSON error body: `{statusCode, code, message}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    code: &'static str,
    message: String,
}

/// Error returned from every handler
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self::from(PipelineError::InputInvalid(message.into()))
    }
}

/// HTTP status for each pipeline failure
pub(crate) fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::InputInvalid(_)
        | PipelineError::DatasetNotReady(_)
        | PipelineError::SqlRejected(_)
        | PipelineError::QueryError(_) => StatusCode::BAD_REQUEST,
        PipelineError::DatasetNotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::QueryTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        PipelineError::PlanUnavailable(_)
        | PipelineError::InvalidPlan(_)
        | PipelineError::SuggestionsUnavailable(_) => StatusCode::BAD_GATEWAY,
        PipelineError::UploadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self {
            status: status_for(&err),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::warn!("{} {}", self.status, self.message);
        }
        let body = ErrorBody {
            status_code: self.status.as_u16(),
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// POST /api/datasets
async fn upload_dataset(
    State(pipeline): State<Arc<Pipeline>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        return Ok(Json(pipeline.upload(&bytes).await?));
    }
    Err(ApiError::bad_request("No CSV file provided"))
}

/// GET /api/datasets
async fn list_datasets(State(pipeline): State<Arc<Pipeline>>) -> Json<Vec<DatasetSummary>> {
    Json(pipeline.list())
}

/// GET /api/datasets/{id}
async fn dataset_status(
    State(pipeline): State<Arc<Pipeline>>,
    Path(id): Path<String>,
) -> Result<Json<DatasetStatus>, ApiError> {
    Ok(Json(pipeline.status(&id)?))
}

/// POST /api/datasets/{id}/suggest-questions
async fn suggest_questions(
    State(pipeline): State<Arc<Pipeline>>,
    Path(id): Path<String>,
) -> Result<Json<Suggestions>, ApiError> {
    Ok(Json(pipeline.suggest_questions(&id).await?))
}

/// POST /api/chat
async fn chat(
    State(pipeline): State<Arc<Pipeline>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(pipeline.chat(&request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PipelineError::InputInvalid("x".into()), StatusCode::BAD_REQUEST),
            (PipelineError::DatasetNotReady("x".into()), StatusCode::BAD_REQUEST),
            (PipelineError::SqlRejected("x".into()), StatusCode::BAD_REQUEST),
            (PipelineError::QueryError("x".into()), StatusCode::BAD_REQUEST),
            (PipelineError::DatasetNotFound("x".into()), StatusCode::NOT_FOUND),
            (
                PipelineError::QueryTimeout { timeout_ms: 1 },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (PipelineError::PlanUnavailable("x".into()), StatusCode::BAD_GATEWAY),
            (PipelineError::InvalidPlan("x".into()), StatusCode::BAD_GATEWAY),
            (
                PipelineError::SuggestionsUnavailable("x".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                PipelineError::UploadFailed("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err), expected, "{err}");
        }
    }

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::from(PipelineError::SqlRejected(
            "Multiple statements not allowed".into(),
        ));
        let body = ErrorBody {
            status_code: err.status.as_u16(),
            code: err.code,
            message: err.message.clone(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["statusCode"], 400);
        assert_eq!(value["code"], "SQL_REJECTED");
        assert!(value["message"]
            .as_str()
            .unwrap()
            .contains("Multiple statements"));
    }

    fn test_app(dir: &tempfile::TempDir) -> Router {
        let mut config = tt_core::Config::default();
        config.data_dir = dir.path().to_string_lossy().into_owned();
        let model = Arc::new(tt_llm::OpenRouterClient::from_config(&config.model));
        router(Arc::new(Pipeline::new(config, model)), 1024)
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_list_datasets_starts_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let (status, body) = send(test_app(&dir), "GET", "/api/datasets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let uri = "/api/datasets/3f1c2a9e-8f6b-4c1d-9a2e-5b7d0c4e1f23";
        let (status, body) = send(test_app(&dir), "GET", uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["code"], "DATASET_NOT_FOUND");
    }
}
