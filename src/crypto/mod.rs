// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cryptographic primitives for the gateway
//!
//! - **Signature**: EIP-191 signature recovery proving control of an address
//! - **Envelope**: AES-256-GCM encryption of off-chain content pointers
//! - **Private key**: parsing of the platform wallet key
//!
//! ## Security Considerations
//!
//! - The envelope key is derived once from the platform key and never rotated
//!   while the process runs
//! - Every envelope uses a fresh random IV
//! - Nonces handed to clients carry 256 bits of OS randomness

pub mod envelope;
pub mod error;
pub mod private_key;
pub mod signature;

use rand::{rngs::OsRng, RngCore};

pub use envelope::EnvelopeCipher;
pub use error::CryptoError;
pub use private_key::parse_private_key;
pub use signature::{
    address_from_private_key, is_hex_address, normalize_address, recover_signer, sign_message,
    verify_signer,
};

/// Unguessable single-use token, hex encoded (64 characters)
pub fn random_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
