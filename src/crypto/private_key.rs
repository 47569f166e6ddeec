// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Platform Private Key Extraction
//!
//! The platform wallet key is the secret from which the envelope encryption
//! key is derived. Configuration and the CLI read it from
//! `PLATFORM_WALLET_PRIVATE_KEY` and parse it here, once.
//!
//! ## Security Considerations
//!
//! - 32-byte hex string, `0x` prefix optional (wallet export format)
//! - Key is NEVER logged or persisted

use anyhow::{anyhow, Result};

/// Parse a 32-byte hex private key
///
/// # Errors
///
/// - Key is empty
/// - Key is not exactly 64 hex characters after the optional `0x`
/// - Key contains non-hex characters
pub fn parse_private_key(raw: &str) -> Result<[u8; 32]> {
    let key_str = raw.trim();

    if key_str.is_empty() {
        return Err(anyhow!("private key is empty"));
    }

    let hex_str = key_str.strip_prefix("0x").unwrap_or(key_str);

    if hex_str.len() != 64 {
        return Err(anyhow!(
            "private key must be exactly 64 hex characters (32 bytes), got {} characters",
            hex_str.len()
        ));
    }

    let key_bytes =
        hex::decode(hex_str).map_err(|e| anyhow!("private key contains invalid hex characters: {}", e))?;

    let mut key_array = [0u8; 32];
    key_array.copy_from_slice(&key_bytes);
    Ok(key_array)
}
