// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Challenge-response authentication
//!
//! - **NonceStore**: issues and retires single-use challenges per address
//! - **AuthorizationGuard**: proves control of an address and checks its
//!   ledger role
//! - **NoteExistsGuard**: rejects requests for notes the ledger does not know

pub mod error;
pub mod guard;
pub mod nonce_store;
pub mod note_id;

pub use error::AuthError;
pub use guard::{AuthorizationGuard, Credentials, NoteExistsGuard, RoleRequirement, VerifiedCaller};
pub use nonce_store::{NonceStore, DEFAULT_NONCE_TTL};
pub use note_id::{NoteId, MAX_SAFE_INTEGER};
