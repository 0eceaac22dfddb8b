//! HTTP request and response bodies.

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{ErrorKind, IngestError, QueryError};
use crate::models::{Answer, RetrievedChunk};

/// Request body accepted as JSON or as an urlencoded form, chosen by
/// `Content-Type`. Anything that is not a form is parsed as JSON.
#[derive(Debug, Clone)]
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::invalid(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::invalid(e.body_text()))?;
            Ok(Self(value))
        }
    }
}

/// Body of `POST /load-doc`: either a server-side path or inline text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadDocRequest {
    #[serde(default)]
    pub doc_path: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Label for inline text; defaults to a checksum of the text.
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QaRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaResponse {
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
}

impl From<Answer> for QaResponse {
    fn from(answer: Answer) -> Self {
        Self {
            answer: answer.answer,
            sources: answer.sources,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub collection: String,
    pub vector_store: bool,
}

/// Error body returned by every route: `{"kind": ..., "message": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Embedding
            | ErrorKind::Store
            | ErrorKind::Query
            | ErrorKind::Generation => StatusCode::BAD_GATEWAY,
            ErrorKind::Configuration | ErrorKind::Cancelled | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::InvalidRequest {
            warn!(error = %err, "rejected document");
        } else {
            error!(error = %err, "ingestion failed");
        }
        Self::new(kind, err.user_message())
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::InvalidRequest {
            warn!(error = %err, "rejected question");
        } else {
            error!(error = %err, "question failed");
        }
        Self::new(kind, err.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EmbeddingError, GenerationError, VectorStoreError};

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(QueryError::InvalidQuestion("empty".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(QueryError::Generation(GenerationError::ServerError(
                "status 500".into()
            )))
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(QueryError::Embedding(EmbeddingError::Timeout(60))).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::from(IngestError::Setup(VectorStoreError::ConnectionError(
                "refused".into()
            )))
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(IngestError::EmptyDocument).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_body_hides_backend_detail() {
        let err = ApiError::from(QueryError::Retrieval(VectorStoreError::SearchError(
            "grpc: internal at 10.0.0.5".into(),
        )));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "query");
        assert!(!json["message"].as_str().unwrap().contains("10.0.0.5"));
    }

    #[test]
    fn test_load_doc_request_variants() {
        let req: LoadDocRequest = serde_json::from_str(r#"{"doc_path": "/tmp/a.txt"}"#).unwrap();
        assert_eq!(req.doc_path.as_deref(), Some("/tmp/a.txt"));
        assert!(req.text.is_none());

        let req: LoadDocRequest =
            serde_json::from_str(r#"{"text": "hello", "source": "note"}"#).unwrap();
        assert_eq!(req.text.as_deref(), Some("hello"));
        assert_eq!(req.source.as_deref(), Some("note"));
    }
}
