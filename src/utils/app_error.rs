use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::{
    arrival_service::types::arrival_error::ArrivalError,
    catalog_service::types::catalog_error::CatalogError,
};

#[derive(Debug)]
pub struct AppError {
    pub code: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl AppError {
    pub fn new(code: StatusCode, kind: &'static str, message: &str) -> Self {
        AppError {
            code,
            kind,
            message: message.to_string(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl From<ArrivalError> for AppError {
    fn from(e: ArrivalError) -> Self {
        let code = match e {
            ArrivalError::CredentialMissing => StatusCode::SERVICE_UNAVAILABLE,
            ArrivalError::UpstreamError(_)
            | ArrivalError::NetworkFailure(_)
            | ArrivalError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        };
        AppError::new(code, e.kind(), &e.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        AppError::new(StatusCode::SERVICE_UNAVAILABLE, e.kind(), &e.to_string())
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponseJson {
    pub kind: String,
    pub message: String,
    /// Whether asking again may succeed without changing the request.
    pub retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response<Body> {
        let retryable = self.code.is_server_error();
        (
            self.code,
            Json(ErrorResponseJson {
                kind: self.kind.to_string(),
                message: self.message,
                retryable,
            }),
        )
            .into_response()
    }
}
