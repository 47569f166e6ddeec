// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Content pinning (IPFS via Pinata)
//!
//! Uploaded documents are pinned publicly and addressed by their CID. Only
//! the CID ever leaves this module.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const DEFAULT_UPLOAD_URL: &str = "https://uploads.pinata.cloud/v3/files";

/// Surfaced verbatim when the credential is rejected
pub const AUTH_FAILURE_MESSAGE: &str =
    "Pinata authentication failed. Please check your PINATA_JWT token is valid and not expired.";

#[derive(Debug, Error)]
pub enum PinningError {
    #[error("{}", AUTH_FAILURE_MESSAGE)]
    Auth,
    #[error("{0}")]
    Upload(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait PinningClient: Send + Sync {
    /// Pin raw bytes under `filename`, returning the CID
    async fn upload_file(&self, bytes: Vec<u8>, filename: &str) -> Result<String, PinningError>;

    /// Pin a JSON document as `name`, returning the CID
    async fn upload_json(&self, value: &Value, name: &str) -> Result<String, PinningError> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| PinningError::Serialization(e.to_string()))?;
        self.upload_file(bytes, name).await
    }
}

#[derive(Debug, Clone)]
pub struct PinataConfig {
    pub jwt: String,
    pub gateway: String,
    pub upload_url: String,
    pub timeout_seconds: u64,
}

impl PinataConfig {
    pub fn new(jwt: impl Into<String>, gateway: impl Into<String>) -> Self {
        Self {
            jwt: jwt.into(),
            gateway: gateway.into(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: Option<UploadedFile>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    cid: Option<String>,
}

/// Pinata v3 upload client
pub struct PinataClient {
    client: reqwest::Client,
    config: PinataConfig,
}

impl PinataClient {
    pub fn new(config: PinataConfig) -> Result<Self, PinningError> {
        if config.jwt.trim().is_empty() {
            return Err(PinningError::Upload("PINATA_JWT is not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| PinningError::Upload(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Public retrieval URL of a pinned CID
    pub fn gateway_url(&self, cid: &str) -> String {
        let gateway = self
            .config
            .gateway
            .trim_start_matches("https://")
            .trim_end_matches('/');
        format!("https://{}/ipfs/{}", gateway, cid)
    }
}

#[async_trait]
impl PinningClient for PinataClient {
    async fn upload_file(&self, bytes: Vec<u8>, filename: &str) -> Result<String, PinningError> {
        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type_for(filename))
            .map_err(|e| PinningError::Upload(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("network", "public");

        debug!("Pinning {} ({} bytes)", filename, size);

        let response = self
            .client
            .post(&self.config.upload_url)
            .header("Authorization", format!("Bearer {}", self.config.jwt))
            .multipart(form)
            .send()
            .await
            .map_err(|e| PinningError::Upload(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PinningError::Upload(e.to_string()))?;

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
            || body.contains("Not Authorized")
        {
            warn!("Pinata rejected credentials (HTTP {})", status);
            return Err(PinningError::Auth);
        }

        if !status.is_success() {
            return Err(PinningError::Upload(format!(
                "Request failed with status code {}",
                status.as_u16()
            )));
        }

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| PinningError::Serialization(e.to_string()))?;

        let cid = parsed
            .data
            .and_then(|file| file.cid)
            .filter(|cid| !cid.is_empty())
            .ok_or_else(|| PinningError::Upload("Upload failed".to_string()))?;

        info!("Pinned {} as {}", filename, cid);
        Ok(cid)
    }
}

/// MIME type from the filename extension, PDF when unknown
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/pdf",
    }
}

/// In-memory pinning for tests
///
/// CIDs are derived from the SHA-256 of the content, so identical uploads
/// yield identical CIDs.
#[derive(Default)]
pub struct MemoryPinning {
    pinned: RwLock<HashMap<String, (String, Vec<u8>)>>,
    reject_auth: AtomicBool,
}

impl MemoryPinning {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an invalid credential on every subsequent upload
    pub fn reject_auth(&self, reject: bool) {
        self.reject_auth.store(reject, Ordering::SeqCst);
    }

    /// Filename and content pinned under `cid`
    pub async fn get(&self, cid: &str) -> Option<(String, Vec<u8>)> {
        self.pinned.read().await.get(cid).cloned()
    }

    pub async fn len(&self) -> usize {
        self.pinned.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pinned.read().await.is_empty()
    }
}

#[async_trait]
impl PinningClient for MemoryPinning {
    async fn upload_file(&self, bytes: Vec<u8>, filename: &str) -> Result<String, PinningError> {
        if self.reject_auth.load(Ordering::SeqCst) {
            return Err(PinningError::Auth);
        }
        let cid = format!("bafy{}", hex::encode(&Sha256::digest(&bytes)[..20]));
        self.pinned
            .write()
            .await
            .insert(cid.clone(), (filename.to_string(), bytes));
        Ok(cid)
    }
}
