// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Single-use challenge nonces
//!
//! Each address holds at most one live nonce. A client fetches it, signs it,
//! and submits the signature; the guard deletes the nonce as soon as the
//! signature has been judged, so a signature authorizes at most one request.
//!
//! Every read-modify-write of the backing table runs under one async mutex,
//! which serializes issuance and deletion across concurrent requests.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::crypto::{normalize_address, random_token};
use crate::storage::kv_store::{self, NonceBackend, NonceRecord, StoreError};

/// Default nonce lifetime (5 minutes)
pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(5 * 60);

/// Absolute expiry for a nonce minted at `now_ms`, saturating at `i64::MAX`
fn expiry_after(now_ms: i64, ttl: Duration) -> i64 {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_add(ttl_ms)
}

pub struct NonceStore {
    backend: Arc<dyn NonceBackend>,
    ttl: Duration,
    lock: Mutex<()>,
}

impl NonceStore {
    pub fn new(backend: Arc<dyn NonceBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            lock: Mutex::new(()),
        }
    }

    /// Return the live nonce for `address`, minting one if there is none
    ///
    /// Expired records of every address are purged first. Re-issuing within
    /// the TTL returns the same nonce.
    pub async fn issue(&self, address: &str) -> Result<String, StoreError> {
        let key = normalize_address(address);
        let _guard = self.lock.lock().await;

        let now = kv_store::now_ms();
        let mut table = self.backend.load().await?;
        let pruned = kv_store::prune_expired(&mut table, now);
        if pruned > 0 {
            debug!("Pruned {} expired nonces", pruned);
        }

        if let Some(existing) = table.get(&key) {
            if existing.is_live(now) {
                if pruned > 0 {
                    self.backend.save(&table).await?;
                }
                return Ok(existing.nonce.clone());
            }
        }

        let nonce = random_token();
        table.insert(
            key.clone(),
            NonceRecord {
                nonce: nonce.clone(),
                expires_at: expiry_after(now, self.ttl),
            },
        );
        self.backend.save(&table).await?;

        info!("Issued nonce for {}", key);
        Ok(nonce)
    }

    /// Live nonce for `address`, if any
    ///
    /// Does not delete; the caller removes it with [`NonceStore::delete`] or
    /// [`NonceStore::delete_if_matches`] once the signature has been judged.
    pub async fn consume(&self, address: &str) -> Result<Option<String>, StoreError> {
        let key = normalize_address(address);
        let _guard = self.lock.lock().await;

        let table = self.backend.load().await?;
        let now = kv_store::now_ms();
        Ok(table
            .get(&key)
            .filter(|record| record.is_live(now))
            .map(|record| record.nonce.clone()))
    }

    /// Remove the record for `address` unconditionally, best-effort
    pub async fn delete(&self, address: &str) {
        let key = normalize_address(address);
        let _guard = self.lock.lock().await;

        let mut table = match self.backend.load().await {
            Ok(table) => table,
            Err(e) => {
                warn!("Nonce delete for {} could not load store: {}", key, e);
                return;
            }
        };
        table.remove(&key);
        kv_store::prune_expired(&mut table, kv_store::now_ms());

        if let Err(e) = self.backend.save(&table).await {
            warn!("Nonce delete for {} could not persist: {}", key, e);
        }
    }

    /// Remove the record only if it still holds `nonce`
    ///
    /// Returns `false` when another request already removed or replaced the
    /// nonce. Persistence failures after a successful match are logged and
    /// still count as a deletion.
    ///
    /// If the table cannot be loaded at all, nothing is deleted and `true`
    /// is returned anyway: the nonce may stay live in the backing store
    /// until it expires.
    pub async fn delete_if_matches(&self, address: &str, nonce: &str) -> bool {
        let key = normalize_address(address);
        let _guard = self.lock.lock().await;

        let mut table = match self.backend.load().await {
            Ok(table) => table,
            Err(e) => {
                warn!("Nonce delete for {} could not load store: {}", key, e);
                return true;
            }
        };

        let now = kv_store::now_ms();
        match table.get(&key) {
            Some(record) if record.nonce == nonce && record.is_live(now) => {}
            _ => {
                debug!("Nonce for {} already used or replaced", key);
                return false;
            }
        }

        table.remove(&key);
        kv_store::prune_expired(&mut table, now);

        if let Err(e) = self.backend.save(&table).await {
            warn!("Nonce delete for {} could not persist: {}", key, e);
        }
        true
    }

    /// Maintenance pass: drop every expired record, returning how many went
    pub async fn prune_expired(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;

        let mut table = self.backend.load().await?;
        let pruned = kv_store::prune_expired(&mut table, kv_store::now_ms());
        if pruned > 0 {
            self.backend.save(&table).await?;
        }
        Ok(pruned)
    }
}
