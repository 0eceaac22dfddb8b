//! HTTP API over the ingestion and query pipelines.

pub mod protocol;

use std::path::Path;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::IngestError;
use crate::models::{Document, IngestReport};
use crate::services::{DocQa, load_document};
use protocol::{ApiError, HealthResponse, JsonOrForm, LoadDocRequest, QaRequest, QaResponse};

/// Shared handler state. Each request runs under a child of `cancel`, so
/// shutting the server down aborts in-flight backend calls.
#[derive(Clone)]
pub struct AppState {
    pub docqa: DocQa,
    pub cancel: CancellationToken,
}

/// Build the router with `/load-doc`, `/qa` and `/health` routes. The POST
/// routes take JSON or urlencoded form bodies.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/load-doc", post(load_doc_handler))
        .route("/qa", post(qa_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serve on `server.bind` until `cancel` fires.
pub async fn run_server(docqa: DocQa, cancel: CancellationToken) -> Result<(), std::io::Error> {
    let bind = docqa.config().server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(
        addr = %listener.local_addr()?,
        collection = %docqa.index().collection(),
        "listening"
    );

    let app = router(AppState {
        docqa,
        cancel: cancel.clone(),
    });
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("server stopped");
    Ok(())
}

async fn load_doc_handler(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<LoadDocRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    let max_bytes = state.docqa.config().server.max_document_bytes;

    let document = match (request.doc_path, request.text) {
        (Some(path), None) => load_document(Path::new(&path), max_bytes).await?,
        (None, Some(text)) => {
            if text.len() as u64 > max_bytes {
                return Err(ApiError::from(IngestError::TooLarge {
                    size: text.len() as u64,
                    limit: max_bytes,
                }));
            }
            match request.source {
                Some(source) => Document::new(source, text),
                None => Document::inline(text),
            }
        }
        (Some(_), Some(_)) => {
            return Err(ApiError::invalid("provide doc_path or text, not both"));
        }
        (None, None) => return Err(ApiError::invalid("doc_path or text is required")),
    };

    let cancel = state.cancel.child_token();
    let report = state.docqa.ingestion().ingest(&document, &cancel).await?;
    Ok(Json(report))
}

async fn qa_handler(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<QaRequest>,
) -> Result<Json<QaResponse>, ApiError> {

    let cancel = state.cancel.child_token();
    let answer = state.docqa.query().answer(&request.question, &cancel).await?;
    Ok(Json(QaResponse::from(answer)))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let index = state.docqa.index();
    let vector_store = index.health_check().await.unwrap_or(false);
    Json(HealthResponse {
        status: "ok".to_string(),
        collection: index.collection().to_string(),
        vector_store,
    })
}
