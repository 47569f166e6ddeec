// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::storage::{PinningError, StoreError};

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    pub data: Option<Value>,
}

/// Body of every successful response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: 200,
            message: "success".to_string(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    BadRequest(String),
    /// Several validation failures reported together
    ValidationErrors(Vec<String>),
    Unauthorized(String),
    PayloadTooLarge(String),
    BadGateway(String),
    InternalError(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationErrors(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::BadGateway(_) => 502,
            ApiError::InternalError(_) => 500,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::ValidationErrors(messages) => messages.join("; "),
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::BadGateway(msg) => msg.clone(),
            ApiError::InternalError(_) => "Internal server error".to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: self.status_code(),
            message: self.message(),
            data: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InternalError(detail) => write!(f, "Internal error: {}", detail),
            other => write!(f, "{} ({})", other.message(), other.status_code()),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::InternalError(detail) = &self {
            error!("Request failed: {}", detail);
        }
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::BadRequest(msg) => ApiError::BadRequest(msg),
            AuthError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            AuthError::OracleUnavailable(ref detail) => {
                warn!("Ledger unavailable: {}", detail);
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::CryptoFailure(ref detail) => {
                warn!("Envelope rejected: {}", detail);
                ApiError::BadRequest(err.to_string())
            }
            AuthError::Internal(detail) => ApiError::InternalError(detail),
        }
    }
}

impl From<PinningError> for ApiError {
    fn from(err: PinningError) -> Self {
        warn!("Pinning failed: {}", err);
        ApiError::BadGateway(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}
