pub mod batch_handler;
pub mod file_handler;
pub mod folder_handler;
pub mod preferences_handler;
pub mod share_handler;
pub mod storage_handler;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::common::errors::{DomainError, ErrorKind};

/// Tipo de resultado para controladores de API
pub type ApiResult<T> = Result<T, ApiError>;

/// Error devuelto por los controladores como `{"error": mensaje}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Expired => StatusCode::GONE,
        ErrorKind::QuotaExceeded => StatusCode::PAYLOAD_TOO_LARGE,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = status_for(err.kind);
        if status.is_server_error() {
            tracing::error!("{} error: {}", err.entity_type, err);
        }
        Self::new(status, err.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::not_found("File", "x"), StatusCode::NOT_FOUND),
            (DomainError::already_exists("Folder", "x"), StatusCode::CONFLICT),
            (DomainError::validation_error("Folder", "bad"), StatusCode::BAD_REQUEST),
            (DomainError::expired("Share", "gone"), StatusCode::GONE),
            (DomainError::quota_exceeded("full"), StatusCode::PAYLOAD_TOO_LARGE),
            (DomainError::internal_error("Database", "down"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn test_message_is_not_prefixed_with_kind() {
        let err = ApiError::from(DomainError::new(ErrorKind::NotFound, "Folder", "Target folder not found"));
        assert_eq!(err.message, "Target folder not found");
    }
}
