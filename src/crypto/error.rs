// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Error type shared by signature recovery and envelope encryption.
//!
//! ## Error Variants
//!
//! - **InvalidSignature**: signature is malformed or public-key recovery failed
//! - **InvalidKey**: platform key has the wrong length or is not a valid scalar
//! - **InvalidEnvelope**: envelope is not base64 or is too short to hold IV + tag + data
//! - **DecryptionFailed**: authentication tag mismatch or plaintext is not UTF-8
//! - **EncryptionFailed**: AEAD encryption refused the input
//!
//! Reasons are operator diagnostics. They are never rendered to API clients
//! as-is; the auth layer maps each variant to a generic public message.

use std::fmt;

/// Error type for all cryptographic operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Signature could not be parsed or no public key could be recovered
    InvalidSignature {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// Invalid cryptographic key
    InvalidKey {
        /// Type of key that failed (e.g., "platform_private_key")
        key_type: String,
        /// Specific failure reason
        reason: String,
    },

    /// Envelope framing is broken before any decryption was attempted
    ///
    /// The reason is safe to show to clients (it never contains key or
    /// plaintext material).
    InvalidEnvelope {
        /// Specific failure reason
        reason: String,
    },

    /// AEAD decryption failed
    ///
    /// This error occurs when:
    /// - Authentication tag verification fails (tampered data or wrong key)
    /// - Decrypted bytes are not valid UTF-8
    DecryptionFailed {
        /// Specific failure reason
        reason: String,
    },

    /// AEAD encryption failed
    EncryptionFailed {
        /// Specific failure reason
        reason: String,
    },
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::InvalidSignature { operation, reason } => {
                write!(f, "Invalid signature during {}: {}", operation, reason)
            }
            CryptoError::InvalidKey { key_type, reason } => {
                write!(f, "Invalid key ({}): {}", key_type, reason)
            }
            CryptoError::InvalidEnvelope { reason } => {
                write!(f, "Invalid envelope: {}", reason)
            }
            CryptoError::DecryptionFailed { reason } => {
                write!(f, "Decryption failed: {}", reason)
            }
            CryptoError::EncryptionFailed { reason } => {
                write!(f, "Encryption failed: {}", reason)
            }
        }
    }
}

impl std::error::Error for CryptoError {}

impl From<base64::DecodeError> for CryptoError {
    fn from(_: base64::DecodeError) -> Self {
        CryptoError::InvalidEnvelope {
            reason: "Invalid base64 format".to_string(),
        }
    }
}

impl From<k256::ecdsa::Error> for CryptoError {
    fn from(err: k256::ecdsa::Error) -> Self {
        CryptoError::InvalidSignature {
            operation: "recover_signer".to_string(),
            reason: format!("k256 error: {}", err),
        }
    }
}
