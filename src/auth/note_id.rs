// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Note identifiers as supplied by clients
//!
//! Ids arrive as JSON numbers. They must be positive integers no larger than
//! 2^53 - 1, the largest integer a JSON client can represent exactly.

use serde_json::Value;
use std::fmt;

use super::error::AuthError;

/// 2^53 - 1
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(u64);

impl NoteId {
    pub fn new(id: u64) -> Result<Self, AuthError> {
        if id < 1 {
            return Err(AuthError::bad_request("Invalid note ID format"));
        }
        if id > MAX_SAFE_INTEGER {
            return Err(AuthError::bad_request("Note ID is too large"));
        }
        Ok(Self(id))
    }

    /// Validate a raw JSON field (`None` when the field is absent)
    pub fn from_json(value: Option<&Value>) -> Result<Self, AuthError> {
        let number = match value {
            None | Some(Value::Null) => return Err(AuthError::bad_request("Note ID is required")),
            Some(Value::Number(number)) => number,
            Some(_) => return Err(AuthError::bad_request("Invalid note ID format")),
        };

        if let Some(id) = number.as_u64() {
            return Self::new(id);
        }
        if number.is_i64() {
            // negative
            return Err(AuthError::bad_request("Invalid note ID format"));
        }

        let float = number.as_f64().unwrap_or(f64::NAN);
        if !float.is_finite() || float.fract() != 0.0 || float < 1.0 {
            return Err(AuthError::bad_request("Invalid note ID format"));
        }
        if float > MAX_SAFE_INTEGER as f64 {
            return Err(AuthError::bad_request("Note ID is too large"));
        }
        Self::new(float as u64)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
