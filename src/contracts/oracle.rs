// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Role lookups against the FilNote ledger
//!
//! The ledger is the system of record for who created, funded, and audited
//! a note. Nothing here is cached: every authorization decision reads
//! current ledger state.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::contracts::types::{FilNote, Note as LedgerNote};
use crate::crypto::normalize_address;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// No such note, including the zero-id sentinel and non-positive ids
    #[error("Note does not exist")]
    NotFound,
    /// The ledger could not answer (transport, revert, malformed response)
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// A note as recorded on the ledger
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: u64,
    pub creator: String,
    /// `None` until the note is funded
    pub investor: Option<String>,
    pub target_amount: U256,
    pub platform_fee_rate_bps: U256,
    pub platform_fee_amount: U256,
    pub protocol_contract: String,
    pub auditor: String,
    pub contract_hash: String,
    pub privacy_certificate_hash: String,
    pub privacy_credentials_abridged_hash: String,
    pub expiry_time: U256,
    pub created_at: u64,
    pub borrowing_days: u32,
    pub interest_rate_bps: u32,
    pub status: u8,
}

impl Note {
    /// Minimal note with the given parties and every other field zeroed
    pub fn new(id: u64, creator: &str, investor: Option<&str>) -> Self {
        Self {
            id,
            creator: normalize_address(creator),
            investor: investor.map(normalize_address),
            target_amount: U256::zero(),
            platform_fee_rate_bps: U256::zero(),
            platform_fee_amount: U256::zero(),
            protocol_contract: format!("{:?}", Address::zero()),
            auditor: format!("{:?}", Address::zero()),
            contract_hash: String::new(),
            privacy_certificate_hash: String::new(),
            privacy_credentials_abridged_hash: String::new(),
            expiry_time: U256::zero(),
            created_at: 0,
            borrowing_days: 0,
            interest_rate_bps: 0,
            status: 0,
        }
    }

    /// True when `address` is the creator or the (present, non-empty) investor
    pub fn is_creator_or_investor(&self, address: &str) -> bool {
        let address = normalize_address(address);
        if address.is_empty() {
            return false;
        }
        if normalize_address(&self.creator) == address {
            return true;
        }
        match &self.investor {
            Some(investor) if !investor.is_empty() => normalize_address(investor) == address,
            _ => false,
        }
    }

    fn from_ledger(raw: LedgerNote) -> Result<Self, OracleError> {
        if raw.id.is_zero() {
            return Err(OracleError::NotFound);
        }
        if raw.id > U256::from(u64::MAX) {
            return Err(OracleError::Unavailable(format!("note id {} out of range", raw.id)));
        }

        let investor = if raw.investor.is_zero() {
            None
        } else {
            Some(format!("{:?}", raw.investor))
        };

        Ok(Self {
            id: raw.id.low_u64(),
            creator: format!("{:?}", raw.creator),
            investor,
            target_amount: raw.target_amount,
            platform_fee_rate_bps: raw.platform_fee_rate_bps,
            platform_fee_amount: raw.platform_fee_amount,
            protocol_contract: format!("{:?}", raw.protocol_contract),
            auditor: format!("{:?}", raw.auditor),
            contract_hash: raw.contract_hash,
            privacy_certificate_hash: raw.privacy_certificate_hash,
            privacy_credentials_abridged_hash: raw.privacy_credentials_abridged_hash,
            expiry_time: raw.expiry_time,
            created_at: raw.created_at,
            borrowing_days: raw.borrowing_days,
            interest_rate_bps: raw.interest_rate_bps,
            status: raw.status,
        })
    }
}

/// Capability surface the authorization guards consume
///
/// Implementors answer three questions: auditor membership, note lookup,
/// and a generic contract read. Infrastructural failures are always
/// `OracleError::Unavailable`, never a `false` answer.
#[async_trait]
pub trait RoleOracle: Send + Sync {
    async fn is_auditor(&self, address: &str) -> Result<bool, OracleError>;

    /// Fetch a note by its positive id
    async fn fetch_note(&self, note_id: u64) -> Result<Note, OracleError>;

    /// Read any view function of the contract by name
    async fn call(&self, method: &str, args: Vec<Token>) -> Result<Vec<Token>, OracleError>;

    /// Fetch a note, rejecting non-positive ids without touching the ledger
    async fn get_note(&self, note_id: i64) -> Result<Note, OracleError> {
        if note_id < 1 {
            return Err(OracleError::NotFound);
        }
        self.fetch_note(note_id as u64).await
    }

    /// Never errors; any failure reads as absent
    async fn note_exists(&self, note_id: i64) -> bool {
        self.get_note(note_id).await.is_ok()
    }

    async fn is_creator_or_investor(&self, note_id: u64, address: &str) -> Result<bool, OracleError> {
        let note = self.fetch_note(note_id).await?;
        Ok(note.is_creator_or_investor(address))
    }
}

/// Ledger-backed oracle over JSON-RPC
pub struct FilNoteOracle {
    contract: FilNote<Provider<Http>>,
    provider: Arc<Provider<Http>>,
    address: Address,
}

impl FilNoteOracle {
    pub fn new(rpc_url: &str, contract_address: &str) -> anyhow::Result<Self> {
        let provider = Arc::new(Provider::<Http>::try_from(rpc_url)?);
        let address: Address = contract_address
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid contract address {}: {}", contract_address, e))?;
        let contract = FilNote::new(address, provider.clone());

        Ok(Self {
            contract,
            provider,
            address,
        })
    }

    pub fn contract_address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl RoleOracle for FilNoteOracle {
    async fn is_auditor(&self, address: &str) -> Result<bool, OracleError> {
        let account: Address = match address.parse() {
            Ok(account) => account,
            Err(_) => {
                debug!("isAuditor skipped for unparsable address {}", address);
                return Ok(false);
            }
        };

        self.contract
            .is_auditor(account)
            .call()
            .await
            .map_err(|e| {
                warn!("isAuditor call failed: {}", e);
                OracleError::Unavailable(format!("Failed to check auditor status: {}", e))
            })
    }

    async fn fetch_note(&self, note_id: u64) -> Result<Note, OracleError> {
        if note_id == 0 {
            return Err(OracleError::NotFound);
        }

        let raw = self
            .contract
            .get_note(U256::from(note_id))
            .call()
            .await
            .map_err(|e| {
                warn!("getNote({}) failed: {}", note_id, e);
                OracleError::Unavailable("Failed to get note".to_string())
            })?;

        Note::from_ledger(raw)
    }

    async fn call(&self, method: &str, args: Vec<Token>) -> Result<Vec<Token>, OracleError> {
        let function = self.contract.abi().function(method).map_err(|_| {
            OracleError::Unavailable(format!("Method {} not found on contract", method))
        })?;

        let data = function.encode_input(&args).map_err(|e| {
            OracleError::Unavailable(format!("Failed to call {}: {}", method, e))
        })?;

        let tx: TypedTransaction = TransactionRequest::new().to(self.address).data(data).into();
        let output = self.provider.call(&tx, None).await.map_err(|e| {
            OracleError::Unavailable(format!("Failed to call {}: {}", method, e))
        })?;

        function
            .decode_output(&output)
            .map_err(|e| OracleError::Unavailable(format!("Failed to call {}: {}", method, e)))
    }
}

/// In-memory ledger for tests
#[derive(Default)]
pub struct MemoryOracle {
    notes: RwLock<HashMap<u64, Note>>,
    auditors: RwLock<HashSet<String>>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_note(&self, note: Note) {
        self.notes.write().await.insert(note.id, note);
    }

    pub async fn add_auditor(&self, address: &str) {
        self.auditors.write().await.insert(normalize_address(address));
    }

    /// Make every subsequent call fail as if the ledger were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of ledger round-trips served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(OracleError::Unavailable("ledger offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleOracle for MemoryOracle {
    async fn is_auditor(&self, address: &str) -> Result<bool, OracleError> {
        self.enter()?;
        Ok(self.auditors.read().await.contains(&normalize_address(address)))
    }

    async fn fetch_note(&self, note_id: u64) -> Result<Note, OracleError> {
        self.enter()?;
        self.notes
            .read()
            .await
            .get(&note_id)
            .cloned()
            .ok_or(OracleError::NotFound)
    }

    async fn call(&self, method: &str, args: Vec<Token>) -> Result<Vec<Token>, OracleError> {
        match (method, args.as_slice()) {
            ("isAuditor", [Token::Address(account)]) => {
                let answer = self.is_auditor(&format!("{:?}", account)).await?;
                Ok(vec![Token::Bool(answer)])
            }
            _ => {
                self.enter()?;
                Err(OracleError::Unavailable(format!(
                    "Method {} not found on contract",
                    method
                )))
            }
        }
    }
}
