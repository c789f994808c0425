use std::any::Any;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{database::StoreError, rules::InsufficientCredit};

/// Every way a request can fail. Client errors leave the stored records untouched.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("odenen_tutar must be a valid number.")]
    InvalidAmount,

    #[error("odenen_tutar must not be negative.")]
    NegativeAmount,

    #[error("Invalid date format. Expected: dd/MM/yyyy")]
    InvalidDate,

    #[error("recurring_day_of_week must be between 0 and 6.")]
    InvalidWeekday,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Student not found. Invalid position.")]
    NotFound,

    #[error(transparent)]
    InsufficientCredit(#[from] InsufficientCredit),

    #[error("Server error ({0})")]
    Store(#[from] StoreError),

    #[error("Server error ({0})")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_)
            | Self::InvalidAmount
            | Self::NegativeAmount
            | Self::InvalidDate
            | Self::InvalidWeekday
            | Self::MalformedBody(_)
            | Self::InsufficientCredit(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        }

        let body = match &self {
            Self::InsufficientCredit(InsufficientCredit { current }) => json!({
                "error": self.to_string(),
                "current_credits": current,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Turns a handler panic into a 500 so the server keeps serving.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::Internal(detail).into_response()
}
