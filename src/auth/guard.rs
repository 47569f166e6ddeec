// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Signature-gated authorization
//!
//! Every protected operation runs the same protocol and differs only in the
//! final role check:
//!
//! 1. require `address` and `signature`
//! 2. look up the live nonce for the address
//! 3. recover the signer of that nonce and compare it with the address
//! 4. delete the nonce (compare-and-delete)
//! 5. ask the ledger whether the address holds the required role
//!
//! Step 4 happens before step 5 so that a signature, once judged, can never
//! be presented again even if the role check fails.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::nonce_store::NonceStore;
use super::note_id::NoteId;
use crate::contracts::{Note, OracleError, RoleOracle};
use crate::crypto::{normalize_address, recover_signer};

pub const MISSING_CREDENTIALS: &str = "Address and signature are required";
pub const NO_NONCE: &str = "Permission error";
pub const INVALID_SIGNATURE: &str = "Invalid signature format";
pub const SIGNATURE_MISMATCH: &str = "Signature mismatch";
pub const NOT_AUDITOR: &str = "You are not an auditor";
pub const NOT_CREATOR_OR_INVESTOR: &str = "You are not the creator or investor of this note";
pub const NOTE_NOT_FOUND: &str = "Note does not exist";
pub const NOTE_FETCH_FAILED: &str = "Note does not exist or failed to fetch";

/// Claimed identity plus proof, as submitted by the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub address: Option<String>,
    pub signature: Option<String>,
}

impl Credentials {
    pub fn new(address: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            signature: Some(signature.into()),
        }
    }

    /// Pull `address` and `signature` out of a JSON request body
    ///
    /// Non-string values are treated as absent.
    pub fn from_json(body: &Value) -> Self {
        let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            address: field("address"),
            signature: field("signature"),
        }
    }

    fn require(&self) -> Result<(String, &str), AuthError> {
        match (self.address.as_deref(), self.signature.as_deref()) {
            (Some(address), Some(signature)) if !address.is_empty() && !signature.is_empty() => {
                Ok((normalize_address(address), signature))
            }
            _ => Err(AuthError::bad_request(MISSING_CREDENTIALS)),
        }
    }
}

/// Role the caller must hold on the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    Auditor,
    CreatorOrInvestor(NoteId),
}

/// Identity established by a successful authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCaller {
    /// Normalized (lowercase) address
    pub address: String,
    pub note_id: Option<NoteId>,
}

#[derive(Clone)]
pub struct AuthorizationGuard {
    nonces: Arc<NonceStore>,
    oracle: Arc<dyn RoleOracle>,
}

impl AuthorizationGuard {
    pub fn new(nonces: Arc<NonceStore>, oracle: Arc<dyn RoleOracle>) -> Self {
        Self { nonces, oracle }
    }

    pub async fn require_auditor(&self, credentials: &Credentials) -> Result<VerifiedCaller, AuthError> {
        self.authorize(credentials, RoleRequirement::Auditor).await
    }

    pub async fn require_creator_or_investor(
        &self,
        credentials: &Credentials,
        note_id: NoteId,
    ) -> Result<VerifiedCaller, AuthError> {
        self.authorize(credentials, RoleRequirement::CreatorOrInvestor(note_id))
            .await
    }

    /// Run the full challenge-response protocol, then check `requirement`
    pub async fn authorize(
        &self,
        credentials: &Credentials,
        requirement: RoleRequirement,
    ) -> Result<VerifiedCaller, AuthError> {
        let (address, signature) = credentials.require()?;
        let nonce = self.verify_signature(&address, signature).await?;

        if !self.nonces.delete_if_matches(&address, &nonce).await {
            warn!("Nonce for {} was consumed concurrently", address);
            return Err(AuthError::unauthorized(NO_NONCE));
        }

        self.check_role(&address, requirement).await?;

        info!("Authorized {} for {:?}", address, requirement);
        Ok(VerifiedCaller {
            address,
            note_id: match requirement {
                RoleRequirement::Auditor => None,
                RoleRequirement::CreatorOrInvestor(id) => Some(id),
            },
        })
    }

    /// Steps 2 and 3: returns the nonce the signature was judged against
    async fn verify_signature(&self, address: &str, signature: &str) -> Result<String, AuthError> {
        let nonce = self
            .nonces
            .consume(address)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or_else(|| {
                debug!("No live nonce for {}", address);
                AuthError::unauthorized(NO_NONCE)
            })?;

        let recovered = recover_signer(&nonce, signature).map_err(|e| {
            debug!("Signature from {} rejected: {}", address, e);
            AuthError::unauthorized(INVALID_SIGNATURE)
        })?;

        if normalize_address(&recovered) != address {
            warn!("Signature mismatch for {}", address);
            return Err(AuthError::unauthorized(SIGNATURE_MISMATCH));
        }

        Ok(nonce)
    }

    async fn check_role(&self, address: &str, requirement: RoleRequirement) -> Result<(), AuthError> {
        let allowed = match requirement {
            RoleRequirement::Auditor => self.oracle.is_auditor(address).await,
            RoleRequirement::CreatorOrInvestor(note_id) => {
                match self
                    .oracle
                    .is_creator_or_investor(note_id.value(), address)
                    .await
                {
                    Err(OracleError::NotFound) => Ok(false),
                    other => other,
                }
            }
        };

        match allowed {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!("{} lacks role {:?}", address, requirement);
                Err(AuthError::unauthorized(match requirement {
                    RoleRequirement::Auditor => NOT_AUDITOR,
                    RoleRequirement::CreatorOrInvestor(_) => NOT_CREATOR_OR_INVESTOR,
                }))
            }
            Err(e) => {
                warn!("Role check for {} failed: {}", address, e);
                Err(AuthError::OracleUnavailable(e.to_string()))
            }
        }
    }
}

/// Rejects requests naming a note the ledger does not know
///
/// Consumes no nonce and may run before or independently of
/// [`AuthorizationGuard`].
#[derive(Clone)]
pub struct NoteExistsGuard {
    oracle: Arc<dyn RoleOracle>,
}

impl NoteExistsGuard {
    pub fn new(oracle: Arc<dyn RoleOracle>) -> Self {
        Self { oracle }
    }

    /// Validate the raw `noteId` field and fetch the note it names
    pub async fn check(&self, raw_note_id: Option<&Value>) -> Result<(NoteId, Note), AuthError> {
        let note_id = NoteId::from_json(raw_note_id)?;

        match self.oracle.fetch_note(note_id.value()).await {
            Ok(note) if note.id != 0 => Ok((note_id, note)),
            Ok(_) | Err(OracleError::NotFound) => Err(AuthError::bad_request(NOTE_NOT_FOUND)),
            Err(OracleError::Unavailable(detail)) => {
                warn!("Fetching note {} failed: {}", note_id, detail);
                Err(AuthError::bad_request(NOTE_FETCH_FAILED))
            }
        }
    }
}
