use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AppError;

/// Error response in the `{"message", "is_valid": false}` envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match &err {
            AppError::InvalidDate(_) | AppError::InvalidTime(_) | AppError::InvalidConfig(_) => {
                Self::bad_request(err.to_string())
            }
            AppError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            AppError::Storage(_) => {
                tracing::error!(error.message = %err, "request failed on storage");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The reservation service is temporarily unavailable.",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "message": self.message,
            "is_valid": false,
        }));
        (self.status, body).into_response()
    }
}
