//! HTTP transport over [`SlideService`].

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use slide_common::DeckRequest;
use slide_core::{ServiceError, SlideService};
use tokio::net::TcpListener;
use tracing::{error, info};

type AppState = Arc<SlideService>;

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/presentations/generate", post(generate))
        .route("/api/presentations/:id", get(fetch))
        .route("/api/presentations/:id/download", get(download))
        .with_state(service)
}

pub async fn serve(service: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(service)).await?;
    Ok(())
}

struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Generation(_) | ServiceError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!("request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "OK", "message": "Server is running" }))
}

async fn generate(
    State(service): State<AppState>,
    Json(request): Json<DeckRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(theme = %request.options.theme, "generate request");
    let deck = service.create_deck(&request.text, &request.options).await?;
    Ok((StatusCode::CREATED, Json(deck)))
}

async fn fetch(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(service.fetch_deck(&id).await?))
}

async fn download(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let download = service.download_deck(&id).await?;
    let headers = [
        (header::CONTENT_TYPE, download.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.filename),
        ),
    ];
    Ok((headers, download.bytes))
}
