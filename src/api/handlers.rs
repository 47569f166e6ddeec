// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::errors::{ApiError, ApiResponse};
use super::http_server::AppState;
use super::requests::{
    DecryptHashRequest, DecryptHashResponse, EncryptHashRequest, EncryptHashResponse,
    UploadForm, UploadResponse, UploadedFile,
};
use crate::auth::{AuthError, Credentials};
use crate::crypto::is_hex_address;

/// Filename under which upload previews are pinned
pub const PRIVACY_CREDENTIALS_FILENAME: &str = "privacy-credentials.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Version number, build tag, date and feature list
    pub version: Value,
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::version::get_version_info(),
    })
}

/// `GET /verify/get-verify-uuid/:address`
pub async fn get_verify_uuid_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<ApiResponse<String>, ApiError> {
    if !is_hex_address(&address) {
        return Err(ApiError::BadRequest(
            "address must be an Ethereum address".to_string(),
        ));
    }

    let nonce = state.nonces.issue(&address).await?;
    Ok(ApiResponse::success(nonce))
}

/// `POST /verify/upload`
///
/// Auditor-only. Pins the contract (and optional privacy certificate and
/// preview data); the certificate's CID is returned encrypted.
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UploadResponse>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let form = read_upload_form(multipart, state.upload_max_size).await?;

    let credentials = Credentials {
        address: form.address.clone(),
        signature: form.signature.clone(),
    };
    let caller = state.guard.require_auditor(&credentials).await?;

    let request = form.validate()?;

    let contract_hash = state
        .pinning
        .upload_file(request.contract.bytes, &request.contract.file_name)
        .await?;

    let mut response = UploadResponse {
        contract_hash,
        encrypted_privacy_certificate_hash: None,
        privacy_credentials_abridged_hash: None,
    };

    if let Some(certificate) = request.privacy_certificate {
        let cid = state
            .pinning
            .upload_file(certificate.bytes, &certificate.file_name)
            .await?;
        let envelope = state
            .cipher
            .encrypt(&cid)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        response.encrypted_privacy_certificate_hash = Some(envelope);
    }

    if let Some(json_data) = request.json_data {
        let cid = state
            .pinning
            .upload_json(&Value::Object(json_data), PRIVACY_CREDENTIALS_FILENAME)
            .await?;
        response.privacy_credentials_abridged_hash = Some(cid);
    }

    info!("Auditor {} uploaded contract {}", caller.address, response.contract_hash);
    Ok(ApiResponse::success(response))
}

async fn read_upload_form(mut multipart: Multipart, max_size: usize) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "address" | "signature" | "jsonData" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                match name.as_str() {
                    "address" => form.address = Some(text),
                    "signature" => form.signature = Some(text),
                    _ => form.json_data = Some(text),
                }
            }
            "contract" | "privacyCertificate" => {
                let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;

                if bytes.len() > max_size {
                    return Err(ApiError::PayloadTooLarge("File too large".to_string()));
                }

                debug!("Received {} ({} bytes)", file_name, bytes.len());
                let file = UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                };
                if name == "contract" {
                    form.contract = Some(file);
                } else {
                    form.privacy_certificate = Some(file);
                }
            }
            other => {
                return Err(ApiError::BadRequest(format!(
                    "property {} should not exist",
                    other
                )))
            }
        }
    }

    Ok(form)
}

/// `POST /encrypt/privacy-certificate`
pub async fn encrypt_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<ApiResponse<EncryptHashResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let request = EncryptHashRequest::from_json(&body)?;

    let encrypted_hash = state
        .cipher
        .encrypt(&request.hash_url)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(ApiResponse::success(EncryptHashResponse {
        encrypted_hash,
        original_hash: request.hash_url,
    }))
}

/// `POST /encrypt/decrypt-privacy-certificate`
///
/// Runs the note existence guard, then the creator-or-investor guard, then
/// opens the envelope.
pub async fn decrypt_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<ApiResponse<DecryptHashResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let (note_id, _note) = state.note_guard.check(body.get("noteId")).await?;
    let caller = state
        .guard
        .require_creator_or_investor(&Credentials::from_json(&body), note_id)
        .await?;

    let request = DecryptHashRequest::from_json(&body)?;
    let decrypted_hash = state
        .cipher
        .decrypt(&request.encrypted_hash)
        .map_err(AuthError::from)?;

    info!("Decrypted certificate of note {} for {}", note_id, caller.address);
    Ok(ApiResponse::success(DecryptHashResponse { decrypted_hash }))
}
