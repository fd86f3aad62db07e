//! HTTP 错误响应
//!
//! 客户端错误返回 4xx，存储故障返回 5xx，响应体统一为 `{ "error": "<details>" }`。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flock_core::{ErrorCategory, FlockError};
use serde::Serialize;
use tracing::{error, warn};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError(pub FlockError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.category() {
            ErrorCategory::Client => StatusCode::BAD_REQUEST,
            ErrorCategory::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCategory::Server => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FlockError> for ApiError {
    fn from(err: FlockError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_client_error() {
            warn!(status = status.as_u16(), error = %self.0, "rejected feed request");
        } else {
            error!(status = status.as_u16(), error = %self.0, "feed request failed");
        }

        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
