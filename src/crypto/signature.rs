// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! EIP-191 Signature Recovery
//!
//! Recovers Ethereum addresses from `personal_sign` signatures. Clients sign
//! the exact nonce string issued to them; the gateway recovers the signer and
//! compares it with the address the client claims.
//!
//! ## Signature Format
//! - 65 bytes: r (32) + s (32) + v (1)
//! - Hex string, `0x` prefix optional
//! - v may be 27/28 (Ethereum standard) or 0/1 (raw recovery id)
//!
//! Recovery never judges whether the recovered address is the expected one.
//! That comparison belongs to the caller (see [`verify_signer`]).

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use tiny_keccak::{Hasher, Keccak};

use super::error::CryptoError;

/// Length of an r + s + v signature in bytes
pub const SIGNATURE_LENGTH: usize = 65;

/// Canonical form of an address: lowercase, compared byte for byte
pub fn normalize_address(address: &str) -> String {
    address.to_lowercase()
}

/// True for `0x` followed by exactly 40 hex digits (any case)
pub fn is_hex_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(hex_part) => hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Create EIP-191 message hash
/// prefix = "\x19Ethereum Signed Message:\n" + len(message)
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());

    let mut hasher = Keccak::v256();
    hasher.update(prefix.as_bytes());
    hasher.update(message);

    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);
    hash
}

/// Recover the address that produced `signature` over `message`
///
/// # Arguments
/// * `message` - exact text that was signed (the issued nonce)
/// * `signature` - 65-byte signature as hex, with or without `0x`
///
/// # Returns
/// Lowercase `0x`-prefixed address (42 characters)
///
/// # Errors
/// `CryptoError::InvalidSignature` when the hex is malformed, the length is
/// not 65 bytes, v is not one of 0/1/27/28, or recovery fails.
pub fn recover_signer(message: &str, signature: &str) -> Result<String, CryptoError> {
    let sig_bytes = hex::decode(signature.strip_prefix("0x").unwrap_or(signature)).map_err(|e| {
        CryptoError::InvalidSignature {
            operation: "recover_signer".to_string(),
            reason: format!("invalid hex: {}", e),
        }
    })?;

    if sig_bytes.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignature {
            operation: "recover_signer".to_string(),
            reason: format!(
                "expected {} bytes, got {}",
                SIGNATURE_LENGTH,
                sig_bytes.len()
            ),
        });
    }

    let v = sig_bytes[64];
    let recovery_byte = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => {
            return Err(CryptoError::InvalidSignature {
                operation: "recover_signer".to_string(),
                reason: format!("invalid v value: {}", v),
            })
        }
    };
    let recovery_id =
        RecoveryId::from_byte(recovery_byte).ok_or_else(|| CryptoError::InvalidSignature {
            operation: "recover_signer".to_string(),
            reason: format!("invalid recovery id: {}", recovery_byte),
        })?;

    let signature = Signature::from_slice(&sig_bytes[..64])?;
    let message_hash = eip191_hash(message.as_bytes());
    let verifying_key = VerifyingKey::recover_from_prehash(&message_hash, &signature, recovery_id)?;

    Ok(address_of(&verifying_key))
}

/// Recover the signer and compare it with `claimed_address`, case-insensitively
///
/// Any recovery failure counts as a mismatch.
pub fn verify_signer(claimed_address: &str, message: &str, signature: &str) -> bool {
    match recover_signer(message, signature) {
        Ok(recovered) => normalize_address(&recovered) == normalize_address(claimed_address),
        Err(_) => false,
    }
}

/// Sign `message` with EIP-191 `personal_sign`
///
/// Returns `0x` + 130 hex characters with v = 27 or 28. Used by client
/// tooling and tests; the gateway itself never signs.
pub fn sign_message(private_key: &[u8; 32], message: &str) -> Result<String, CryptoError> {
    let signing_key = signing_key_from(private_key)?;
    let message_hash = eip191_hash(message.as_bytes());

    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(&message_hash)
        .map_err(|e| CryptoError::InvalidSignature {
            operation: "sign_message".to_string(),
            reason: format!("signing failed: {}", e),
        })?;

    let mut sig_bytes = [0u8; SIGNATURE_LENGTH];
    sig_bytes[..64].copy_from_slice(&signature.to_bytes());
    sig_bytes[64] = recovery_id.to_byte() + 27;

    Ok(format!("0x{}", hex::encode(sig_bytes)))
}

/// Address controlled by `private_key`
pub fn address_from_private_key(private_key: &[u8; 32]) -> Result<String, CryptoError> {
    let signing_key = signing_key_from(private_key)?;
    Ok(address_of(signing_key.verifying_key()))
}

fn signing_key_from(private_key: &[u8; 32]) -> Result<SigningKey, CryptoError> {
    SigningKey::from_slice(private_key).map_err(|e| CryptoError::InvalidKey {
        key_type: "secp256k1_private_key".to_string(),
        reason: e.to_string(),
    })
}

/// Last 20 bytes of keccak256(uncompressed public key without the 0x04 prefix)
fn address_of(verifying_key: &VerifyingKey) -> String {
    let public_key = k256::PublicKey::from(verifying_key);
    let encoded = public_key.to_encoded_point(false);

    let mut hasher = Keccak::v256();
    hasher.update(&encoded.as_bytes()[1..]);
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);

    format!("0x{}", hex::encode(&hash[12..]))
}
