// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;

use crate::crypto::{address_from_private_key, parse_private_key, sign_message};

/// Arguments for sign-nonce command
#[derive(Args, Debug)]
pub struct SignNonceArgs {
    /// Wallet private key (can also be set via WALLET_PRIVATE_KEY env var)
    #[arg(long, env = "WALLET_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// Nonce returned by GET /verify/get-verify-uuid/{address}
    #[arg(long)]
    pub nonce: String,
}

/// Arguments for address command
#[derive(Args, Debug)]
pub struct AddressArgs {
    /// Wallet private key (can also be set via WALLET_PRIVATE_KEY env var)
    #[arg(long, env = "WALLET_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,
}

pub fn sign_nonce(args: SignNonceArgs) -> Result<String> {
    let key = parse_private_key(&args.private_key)?;
    let address = address_from_private_key(&key).map_err(|e| anyhow!("{}", e))?;
    let signature = sign_message(&key, &args.nonce).map_err(|e| anyhow!("{}", e))?;

    Ok(format!("address:   {}\nsignature: {}", address, signature))
}

pub fn show_address(args: AddressArgs) -> Result<String> {
    let key = parse_private_key(&args.private_key)?;
    address_from_private_key(&key).map_err(|e| anyhow!("{}", e))
}
