use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Per-request authentication/authorization failures.
///
/// Every variant maps to a structured client-facing error; none of them
/// carries internal crypto detail. `AuthenticationFailed` is deliberately
/// opaque so the response cannot distinguish an unknown email address from
/// a wrong password.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email address or password")]
    AuthenticationFailed,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("The access token is invalid")]
    TokenInvalid,

    #[error("The access token has expired")]
    TokenExpired,

    #[error("The access token is not valid for this endpoint")]
    WrongAudience,

    #[error("Insufficient scope: required {required}")]
    InsufficientScope { required: &'static str },

    #[error("Access denied")]
    Forbidden,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),
}

/// A single field-level validation failure on a request body.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, fields) = match &self {
            AuthError::AuthenticationFailed => {
                (StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED", vec![])
            }
            AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", vec![]),
            AuthError::TokenInvalid => (StatusCode::UNAUTHORIZED, "TOKEN_INVALID", vec![]),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED", vec![]),
            AuthError::WrongAudience => (StatusCode::FORBIDDEN, "WRONG_AUDIENCE", vec![]),
            AuthError::InsufficientScope { .. } => {
                (StatusCode::FORBIDDEN, "INSUFFICIENT_SCOPE", vec![])
            }
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", vec![]),
            AuthError::Validation(fields) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED", fields.clone())
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                fields,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
