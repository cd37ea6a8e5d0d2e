use http::StatusCode;
use thiserror::Error;

use crate::clients::notebooklm::BackendError;
use crate::models::{ErrorDetail, ErrorKind, ErrorResponse};

/// Every failure a request can end in, already classified for the wire.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    InvalidRequest { code: &'static str, message: String },
    #[error("{message}")]
    Authentication { code: &'static str, message: String },
    #[error("{message}")]
    Server { code: &'static str, message: String },
    #[error("{message}")]
    Api { status: StatusCode, message: String },
}

impl ApiError {
    pub fn no_user_message() -> Self {
        ApiError::InvalidRequest {
            code: "no_user_message",
            message: "No user message found in request".to_string(),
        }
    }

    pub fn missing_notebook_id() -> Self {
        ApiError::InvalidRequest {
            code: "missing_notebook_id",
            message: "notebook_id is required (set in request or NOTEBOOKLM_NOTEBOOK_ID env var)"
                .to_string(),
        }
    }

    pub fn invalid_body(err: impl std::fmt::Display) -> Self {
        ApiError::InvalidRequest {
            code: "invalid_request_body",
            message: format!("Invalid request body: {}", err),
        }
    }

    pub fn invalid_api_key() -> Self {
        ApiError::Authentication {
            code: "invalid_api_key",
            message: "Invalid API key".to_string(),
        }
    }

    /// Backend failure on the non-streaming path.
    pub fn processing_failed(err: &BackendError) -> Self {
        ApiError::Server {
            code: "processing_failed",
            message: err.to_string(),
        }
    }

    /// Backend failure on the streaming path.
    pub fn streaming_failed(err: &BackendError) -> Self {
        ApiError::Server {
            code: "streaming_failed",
            message: err.to_string(),
        }
    }

    pub fn not_found() -> Self {
        ApiError::Api {
            status: StatusCode::NOT_FOUND,
            message: "Not Found".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Server { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Api { status, .. } => *status,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidRequest { .. } => ErrorKind::InvalidRequestError,
            ApiError::Authentication { .. } => ErrorKind::AuthenticationError,
            ApiError::Server { .. } => ErrorKind::ServerError,
            ApiError::Api { .. } => ErrorKind::ApiError,
        }
    }

    pub fn code(&self) -> String {
        match self {
            ApiError::InvalidRequest { code, .. }
            | ApiError::Authentication { code, .. }
            | ApiError::Server { code, .. } => code.to_string(),
            ApiError::Api { status, .. } => format!("http_{}", status.as_u16()),
        }
    }

    pub fn to_envelope(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                kind: self.kind(),
                code: self.code(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_bad_requests() {
        for err in [ApiError::no_user_message(), ApiError::missing_notebook_id()] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.kind(), ErrorKind::InvalidRequestError);
        }
        assert_eq!(ApiError::no_user_message().code(), "no_user_message");
        assert_eq!(ApiError::missing_notebook_id().code(), "missing_notebook_id");
    }

    #[test]
    fn test_invalid_api_key_is_unauthorized() {
        let err = ApiError::invalid_api_key();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.kind(), ErrorKind::AuthenticationError);
    }

    #[test]
    fn test_backend_failure_keeps_only_the_message() {
        let backend = BackendError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        let envelope = ApiError::processing_failed(&backend).to_envelope();
        assert_eq!(envelope.error.kind, ErrorKind::ServerError);
        assert_eq!(envelope.error.code, "processing_failed");
        assert_eq!(envelope.error.message, backend.to_string());

        let streamed = ApiError::streaming_failed(&backend);
        assert_eq!(streamed.code(), "streaming_failed");
        assert_eq!(streamed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unclassified_http_failure_uses_status_code() {
        let err = ApiError::not_found();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), ErrorKind::ApiError);
        assert_eq!(err.code(), "http_404");
        assert_eq!(err.to_envelope().error.message, "Not Found");
    }
}
