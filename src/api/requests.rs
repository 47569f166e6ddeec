// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request bodies and their validation
//!
//! Validation collects every problem with a body before failing, so a
//! client sees all of them in one response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::ApiError;
use crate::crypto::is_hex_address;

pub const ENCRYPTED_HASH_MIN_LENGTH: usize = 32;
pub const ENCRYPTED_HASH_MAX_LENGTH: usize = 10_000;
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const JSON_DATA_MESSAGE: &str =
    "jsonData must be an object with name:value format where both name and value are non-empty";

/// `0x` followed by at least one hex digit
pub fn is_hex_signature(signature: &str) -> bool {
    match signature.strip_prefix("0x") {
        Some(hex_part) => !hex_part.is_empty() && hex_part.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

fn string_field<'a>(body: &'a Value, name: &str, errors: &mut Vec<String>) -> Option<&'a str> {
    match body.get(name) {
        Some(Value::String(value)) => Some(value.as_str()),
        _ => {
            errors.push(format!("{} must be a string", name));
            None
        }
    }
}

fn check_signature(signature: Option<&str>, errors: &mut Vec<String>) {
    if let Some(signature) = signature {
        if !is_hex_signature(signature) {
            errors.push("signature must match /^0x[a-fA-F0-9]+$/ regular expression".to_string());
        }
    }
}

fn check_address(address: Option<&str>, errors: &mut Vec<String>) {
    match address {
        Some(address) if is_hex_address(address) => {}
        _ => errors.push("address must be an Ethereum address".to_string()),
    }
}

fn finish<T>(errors: Vec<String>, value: impl FnOnce() -> T) -> Result<T, ApiError> {
    if errors.is_empty() {
        Ok(value())
    } else {
        Err(ApiError::ValidationErrors(errors))
    }
}

/// `POST /encrypt/privacy-certificate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EncryptHashRequest {
    pub hash_url: String,
}

impl EncryptHashRequest {
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let mut errors = Vec::new();
        let hash_url = string_field(body, "hashUrl", &mut errors);
        if hash_url.map_or(true, str::is_empty) {
            errors.push("hashUrl should not be empty".to_string());
        }
        finish(errors, || Self {
            hash_url: hash_url.unwrap_or_default().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EncryptHashResponse {
    pub encrypted_hash: String,
    pub original_hash: String,
}

/// `POST /encrypt/decrypt-privacy-certificate`
///
/// `noteId` is validated by the note guards, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecryptHashRequest {
    pub encrypted_hash: String,
    pub address: String,
    pub signature: String,
}

impl DecryptHashRequest {
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let mut errors = Vec::new();

        let encrypted_hash = string_field(body, "encryptedHash", &mut errors);
        match encrypted_hash {
            Some("") | None => errors.push("encryptedHash should not be empty".to_string()),
            Some(hash) => {
                let length = hash.chars().count();
                if !(ENCRYPTED_HASH_MIN_LENGTH..=ENCRYPTED_HASH_MAX_LENGTH).contains(&length) {
                    errors.push(format!(
                        "encryptedHash must be longer than or equal to {} and shorter than or equal to {} characters",
                        ENCRYPTED_HASH_MIN_LENGTH, ENCRYPTED_HASH_MAX_LENGTH
                    ));
                }
            }
        }

        let signature = string_field(body, "signature", &mut errors);
        check_signature(signature, &mut errors);

        let address = body.get("address").and_then(Value::as_str);
        check_address(address, &mut errors);

        finish(errors, || Self {
            encrypted_hash: encrypted_hash.unwrap_or_default().to_string(),
            address: address.unwrap_or_default().to_string(),
            signature: signature.unwrap_or_default().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecryptHashResponse {
    pub decrypted_hash: String,
}

/// One file part of a multipart upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    fn check(&self, field: &str, errors: &mut Vec<String>) {
        if self.content_type.as_deref() != Some(PDF_CONTENT_TYPE) {
            errors.push(format!("Unsupported file type for {}", field));
        }
        if self.bytes.is_empty() {
            errors.push(format!("{} file is empty", field));
        }
    }
}

/// Raw fields of `POST /verify/upload`, as read from the multipart stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadForm {
    pub address: Option<String>,
    pub signature: Option<String>,
    pub json_data: Option<String>,
    pub contract: Option<UploadedFile>,
    pub privacy_certificate: Option<UploadedFile>,
}

/// An upload that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub contract: UploadedFile,
    pub privacy_certificate: Option<UploadedFile>,
    pub json_data: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub contract_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_privacy_certificate_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy_credentials_abridged_hash: Option<String>,
}

impl UploadForm {
    pub fn validate(self) -> Result<UploadRequest, ApiError> {
        let mut errors = Vec::new();

        if self.signature.is_none() {
            errors.push("signature must be a string".to_string());
        }
        check_signature(self.signature.as_deref(), &mut errors);
        check_address(self.address.as_deref(), &mut errors);

        let json_data = match self.json_data.as_deref() {
            None => None,
            Some(raw) => match parse_json_data(raw) {
                Ok(map) => Some(map),
                Err(message) => {
                    errors.push(message);
                    None
                }
            },
        };

        if let Some(contract) = &self.contract {
            contract.check("contract", &mut errors);
        } else {
            errors.push("Contract file is required".to_string());
        }

        if let Some(certificate) = &self.privacy_certificate {
            certificate.check("privacyCertificate", &mut errors);
            if self.json_data.is_none() {
                errors.push("jsonData is required when privacyCertificate is provided".to_string());
            }
        }

        if !errors.is_empty() {
            return Err(ApiError::ValidationErrors(errors));
        }

        match self.contract {
            Some(contract) => Ok(UploadRequest {
                contract,
                privacy_certificate: self.privacy_certificate,
                json_data,
            }),
            None => Err(ApiError::BadRequest("Contract file is required".to_string())),
        }
    }
}

/// Parse and check the `jsonData` field
///
/// Must be a flat, non-empty object whose keys are not blank and whose
/// values are numbers, booleans or non-blank strings.
pub fn parse_json_data(raw: &str) -> Result<Map<String, Value>, String> {
    let value: Value = serde_json::from_str(raw).map_err(|_| JSON_DATA_MESSAGE.to_string())?;
    match value {
        Value::Object(map) if is_name_value_object(&map) => Ok(map),
        _ => Err(JSON_DATA_MESSAGE.to_string()),
    }
}

fn is_name_value_object(map: &Map<String, Value>) -> bool {
    !map.is_empty()
        && map.iter().all(|(key, value)| {
            !key.trim().is_empty()
                && match value {
                    Value::String(s) => !s.trim().is_empty(),
                    Value::Number(_) | Value::Bool(_) => true,
                    Value::Null | Value::Array(_) | Value::Object(_) => false,
                }
        })
}
