// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod crypto;
pub mod storage;
pub mod version;

// Re-export main types
pub use api::{router, AppState};
pub use auth::{AuthError, AuthorizationGuard, NonceStore, NoteExistsGuard, VerifiedCaller};
pub use contracts::{Note, RoleOracle};
pub use crypto::EnvelopeCipher;
