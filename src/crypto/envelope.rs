// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AES-256-GCM Envelope Encryption
//!
//! Protects short reference strings (IPFS CIDs of privacy certificates) with
//! a key derived from the platform wallet key.
//!
//! **Envelope Format** (base64 of the whole buffer):
//! ```text
//! [iv (16 bytes) | tag (16 bytes) | ciphertext (>= 1 byte)]
//! ```
//!
//! - Key: SHA-256 of the 32 raw platform key bytes, derived once
//! - IV: 16 random bytes, fresh for every encryption
//! - Tag: 16-byte GCM authentication tag, stored detached before the ciphertext
//! - No Additional Authenticated Data

use aes_gcm::{
    aead::{consts::U16, AeadInPlace, KeyInit},
    aes::Aes256,
    AesGcm, Nonce, Tag,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;

use super::error::CryptoError;

/// AES-256-GCM with a 16-byte IV
type Aes256Gcm16 = AesGcm<Aes256, U16>;

pub const IV_LENGTH: usize = 16;
pub const TAG_LENGTH: usize = 16;
/// IV + tag; anything shorter cannot be an envelope
pub const MIN_ENVELOPE_LENGTH: usize = IV_LENGTH + TAG_LENGTH;

/// Symmetric envelope cipher bound to one derived key for its lifetime
///
/// # Example
///
/// ```rust,ignore
/// use filnote_gateway::crypto::EnvelopeCipher;
///
/// let cipher = EnvelopeCipher::from_private_key(&platform_key);
/// let envelope = cipher.encrypt("bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi")?;
/// let cid = cipher.decrypt(&envelope)?;
/// ```
#[derive(Clone)]
pub struct EnvelopeCipher {
    cipher: Aes256Gcm16,
}

impl EnvelopeCipher {
    /// Derive the envelope key as SHA-256(private key bytes)
    pub fn from_private_key(private_key: &[u8; 32]) -> Self {
        let key = Sha256::digest(private_key);
        Self {
            cipher: Aes256Gcm16::new(&key),
        }
    }

    /// Encrypt `plaintext` into a base64 envelope under a fresh random IV
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        if plaintext.is_empty() {
            return Err(CryptoError::EncryptionFailed {
                reason: "plaintext is empty".to_string(),
            });
        }

        let mut iv = [0u8; IV_LENGTH];
        OsRng.fill_bytes(&mut iv);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut buffer)
            .map_err(|e| CryptoError::EncryptionFailed {
                reason: e.to_string(),
            })?;

        let mut combined = Vec::with_capacity(MIN_ENVELOPE_LENGTH + buffer.len());
        combined.extend_from_slice(&iv);
        combined.extend_from_slice(tag.as_slice());
        combined.extend_from_slice(&buffer);

        Ok(BASE64.encode(combined))
    }

    /// Open a base64 envelope produced by [`EnvelopeCipher::encrypt`]
    ///
    /// # Errors
    ///
    /// - `InvalidEnvelope` if the input is empty, not base64, shorter than
    ///   32 bytes, or carries no ciphertext
    /// - `DecryptionFailed` if the tag does not verify or the plaintext is
    ///   not UTF-8
    pub fn decrypt(&self, envelope: &str) -> Result<String, CryptoError> {
        if envelope.is_empty() {
            return Err(CryptoError::InvalidEnvelope {
                reason: "Invalid encrypted hash format".to_string(),
            });
        }

        let combined = BASE64.decode(envelope)?;

        if combined.len() < MIN_ENVELOPE_LENGTH {
            return Err(CryptoError::InvalidEnvelope {
                reason: "Encrypted hash is too short".to_string(),
            });
        }

        let (iv, rest) = combined.split_at(IV_LENGTH);
        let (tag, ciphertext) = rest.split_at(TAG_LENGTH);

        if ciphertext.is_empty() {
            return Err(CryptoError::InvalidEnvelope {
                reason: "Encrypted data is empty".to_string(),
            });
        }

        let mut buffer = ciphertext.to_vec();
        self.cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(iv),
                b"",
                &mut buffer,
                Tag::from_slice(tag),
            )
            .map_err(|_| CryptoError::DecryptionFailed {
                reason: "authentication tag mismatch".to_string(),
            })?;

        String::from_utf8(buffer).map_err(|_| CryptoError::DecryptionFailed {
            reason: "plaintext is not valid UTF-8".to_string(),
        })
    }
}

impl fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeCipher").finish_non_exhaustive()
    }
}
