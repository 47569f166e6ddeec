// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persistence for the nonce table
//!
//! The table is a flat `address -> record` map kept in a single JSON
//! document:
//!
//! ```json
//! { "verifications": { "0xabc...": { "uuid": "<nonce>", "expiresAt": 1735000000000 } } }
//! ```
//!
//! Backends only load and save whole tables; expiry and single-use rules
//! live in [`crate::auth::NonceStore`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::crypto::random_token;

/// TTL given to records migrated from the legacy array schema
pub const LEGACY_MIGRATION_TTL_MS: i64 = 60 * 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// One issued nonce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRecord {
    #[serde(rename = "uuid")]
    pub nonce: String,
    /// Absolute expiry, epoch milliseconds
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

impl NonceRecord {
    /// A record is live strictly before its expiry instant
    pub fn is_live(&self, now_ms: i64) -> bool {
        !self.nonce.is_empty() && self.expires_at > now_ms
    }
}

/// Normalized address -> record
pub type NonceTable = BTreeMap<String, NonceRecord>;

/// Remove every record that is no longer live, returning how many went
pub fn prune_expired(table: &mut NonceTable, now_ms: i64) -> usize {
    let before = table.len();
    table.retain(|_, record| record.is_live(now_ms));
    before - table.len()
}

/// Current time in epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Whole-table persistence backend
#[async_trait]
pub trait NonceBackend: Send + Sync {
    /// Load the table. Malformed records are dropped, never surfaced.
    async fn load(&self) -> Result<NonceTable, StoreError>;

    /// Replace the persisted table
    async fn save(&self, table: &NonceTable) -> Result<(), StoreError>;
}

#[derive(Serialize)]
struct NonceDocument<'a> {
    verifications: &'a NonceTable,
}

/// File-backed JSON store
///
/// Missing, empty, or corrupt files are re-initialised with the empty
/// schema instead of failing.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).await?;
            }
        }
        Ok(())
    }

    async fn write_table(&self, table: &NonceTable) -> Result<(), StoreError> {
        self.ensure_parent_dir().await?;

        let json = serde_json::to_string_pretty(&NonceDocument {
            verifications: table,
        })?;

        // Write atomically using a temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;

        fs::rename(temp_path, &self.path).await?;
        Ok(())
    }

    async fn reset(&self) -> Result<NonceTable, StoreError> {
        let table = NonceTable::new();
        self.write_table(&table).await?;
        Ok(table)
    }
}

#[async_trait]
impl NonceBackend for JsonFileStore {
    async fn load(&self) -> Result<NonceTable, StoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Nonce store {:?} missing, initialising", self.path);
                return self.reset().await;
            }
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return self.reset().await;
        }

        let document: Value = match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                warn!("Nonce store {:?} is corrupt ({}), reinitialising", self.path, e);
                return self.reset().await;
            }
        };

        match document.get("verifications") {
            Some(Value::Object(entries)) => {
                let mut table = NonceTable::new();
                for (address, raw) in entries {
                    match parse_record(raw) {
                        Some(record) => {
                            table.insert(address.clone(), record);
                        }
                        None => debug!("Dropping malformed nonce record for {}", address),
                    }
                }
                Ok(table)
            }
            Some(Value::Array(legacy)) => {
                let table = migrate_legacy(legacy, now_ms());
                info!("Migrated {} legacy nonce entries", table.len());
                self.write_table(&table).await?;
                Ok(table)
            }
            _ => self.reset().await,
        }
    }

    async fn save(&self, table: &NonceTable) -> Result<(), StoreError> {
        self.write_table(table).await
    }
}

/// Accepts `{ "uuid": <non-empty string>, "expiresAt": <number> }`
fn parse_record(raw: &Value) -> Option<NonceRecord> {
    let nonce = raw.get("uuid")?.as_str()?;
    if nonce.is_empty() {
        return None;
    }

    let expires_at = raw.get("expiresAt")?;
    let expires_at = expires_at
        .as_i64()
        .or_else(|| expires_at.as_f64().map(|ms| ms as i64))?;

    Some(NonceRecord {
        nonce: nonce.to_string(),
        expires_at,
    })
}

/// Older deployments stored a bare array of addresses
fn migrate_legacy(legacy: &[Value], now_ms: i64) -> NonceTable {
    legacy
        .iter()
        .filter_map(Value::as_str)
        .map(|address| {
            (
                address.to_lowercase(),
                NonceRecord {
                    nonce: random_token(),
                    expires_at: now_ms + LEGACY_MIGRATION_TTL_MS,
                },
            )
        })
        .collect()
}

/// In-process backend for tests and ephemeral deployments
#[derive(Default)]
pub struct MemoryStore {
    table: Mutex<NonceTable>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail until switched off
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Put a record in place directly, bypassing issuance rules
    pub async fn insert_raw(&self, address: &str, record: NonceRecord) {
        self.table.lock().await.insert(address.to_string(), record);
    }

    pub async fn snapshot(&self) -> NonceTable {
        self.table.lock().await.clone()
    }
}

#[async_trait]
impl NonceBackend for MemoryStore {
    async fn load(&self) -> Result<NonceTable, StoreError> {
        Ok(self.table.lock().await.clone())
    }

    async fn save(&self, table: &NonceTable) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected save failure".to_string()));
        }
        *self.table.lock().await = table.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
