//! Login and token-minting handlers.

use crate::errors::{AuthError, FieldError};
use crate::models::{Account, AccountResponse, LoginResponse, StreamTokenResponse};
use crate::AppState;
use axum::{extract::State, Extension, Json};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email_address: String,
    pub password: SecretString,
}

/// Handle a login request.
///
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    validate(&payload)?;

    let (token, account) = state
        .authentication
        .authenticate(&payload.email_address, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        authentication_token: token,
        account: AccountResponse::from(&account),
    }))
}

/// Mint a short-lived event-stream handshake token for the authenticated
/// caller.
///
/// POST /api/v1/auth/stream-token
pub async fn stream_token(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<Account>,
) -> Result<Json<StreamTokenResponse>, AuthError> {
    let access_token = state.authentication.issue_stream_token(&account)?;
    Ok(Json(StreamTokenResponse { access_token }))
}

fn validate(payload: &LoginRequest) -> Result<(), AuthError> {
    let mut fields = Vec::new();

    if payload.email_address.trim().is_empty() {
        fields.push(FieldError {
            field: "email_address",
            message: "must not be empty",
        });
    } else if !is_valid_email(&payload.email_address) {
        fields.push(FieldError {
            field: "email_address",
            message: "is not a valid email address",
        });
    }

    if payload.password.expose_secret().is_empty() {
        fields.push(FieldError {
            field: "password",
            message: "must not be empty",
        });
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(fields))
    }
}

/// Basic shape check: something@domain.with-a-dot, no empty labels.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}
