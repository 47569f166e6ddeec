// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;

use crate::crypto::{parse_private_key, EnvelopeCipher};

/// Arguments for encrypt command
#[derive(Args, Debug)]
pub struct EncryptArgs {
    /// Content reference to protect (usually an IPFS CID)
    #[arg(long)]
    pub hash: String,

    /// Platform key (can also be set via PLATFORM_WALLET_PRIVATE_KEY env var)
    #[arg(long, env = "PLATFORM_WALLET_PRIVATE_KEY", hide_env_values = true)]
    pub platform_key: String,
}

/// Arguments for decrypt command
#[derive(Args, Debug)]
pub struct DecryptArgs {
    /// Base64 envelope
    #[arg(long)]
    pub envelope: String,

    /// Platform key (can also be set via PLATFORM_WALLET_PRIVATE_KEY env var)
    #[arg(long, env = "PLATFORM_WALLET_PRIVATE_KEY", hide_env_values = true)]
    pub platform_key: String,
}

fn cipher(platform_key: &str) -> Result<EnvelopeCipher> {
    let key = parse_private_key(platform_key)?;
    Ok(EnvelopeCipher::from_private_key(&key))
}

pub fn encrypt(args: EncryptArgs) -> Result<String> {
    cipher(&args.platform_key)?
        .encrypt(&args.hash)
        .map_err(|e| anyhow!("{}", e))
}

pub fn decrypt(args: DecryptArgs) -> Result<String> {
    cipher(&args.platform_key)?
        .decrypt(&args.envelope)
        .map_err(|e| anyhow!("{}", e))
}
