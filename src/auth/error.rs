// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use thiserror::Error;

use crate::contracts::OracleError;
use crate::crypto::CryptoError;

/// Generic message for any ledger failure during authorization
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";
/// Generic message for any failure to open an envelope
pub const DECRYPTION_FAILED: &str = "Decryption failed";

/// Outcome classes of an authorization or decryption attempt
///
/// `Display` yields the message safe to show a client. Internal detail
/// carried by `OracleUnavailable` and `CryptoFailure` is for logs only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{}", AUTHENTICATION_FAILED)]
    OracleUnavailable(String),
    #[error("{}", DECRYPTION_FAILED)]
    CryptoFailure(String),
    #[error("Internal server error")]
    Internal(String),
}

impl AuthError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AuthError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AuthError::Unauthorized(message.into())
    }

    /// Detail suitable for logs, never for responses
    pub fn detail(&self) -> &str {
        match self {
            AuthError::BadRequest(msg)
            | AuthError::Unauthorized(msg)
            | AuthError::OracleUnavailable(msg)
            | AuthError::CryptoFailure(msg)
            | AuthError::Internal(msg) => msg,
        }
    }
}

impl From<OracleError> for AuthError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::NotFound => AuthError::BadRequest(err.to_string()),
            OracleError::Unavailable(detail) => AuthError::OracleUnavailable(detail),
        }
    }
}

impl From<CryptoError> for AuthError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidEnvelope { reason } => AuthError::BadRequest(reason),
            other => AuthError::CryptoFailure(other.to_string()),
        }
    }
}
