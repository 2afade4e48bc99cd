use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

use crate::domain::catalog::CatalogError;
use crate::domain::order::OrderError;
use crate::domain::ErrorKind;
use crate::identity::AuthError;

/// Error returned by every handler.
///
/// Carries the status, a stable machine-readable code and the message shown
/// to the client. Internal failures are logged here and replaced with a
/// generic message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn timeout() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "TIMEOUT",
            "Request timed out; the outcome is unknown, re-read the order before retrying",
        )
    }

    fn from_kind(kind: ErrorKind, code: &'static str, error: &dyn std::error::Error) -> Self {
        let status = status_for(kind);

        match kind {
            ErrorKind::Internal => {
                tracing::error!(code, error = %error, source = ?error.source(), "Request failed");
                Self::new(status, code, "Internal server error")
            }
            ErrorKind::Unavailable => {
                tracing::warn!(code, error = %error, "Dependency unavailable");
                Self::new(status, code, "Service temporarily unavailable, please retry")
            }
            _ => Self::new(status, code, error.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(ErrorBody {
            error: &self.message,
            code: self.code,
        })
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        Self::from_kind(e.kind(), e.code(), &e)
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        Self::from_kind(e.kind(), e.code(), &e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Issue(_) => Self::from_kind(ErrorKind::Internal, "TOKEN_ISSUE_FAILED", &e),
            AuthError::MissingToken => Self::new(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", e.to_string()),
            AuthError::InvalidToken(_) => Self::new(StatusCode::UNAUTHORIZED, "INVALID_TOKEN", e.to_string()),
        }
    }
}
