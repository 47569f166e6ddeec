// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Gateway configuration
//!
//! Every setting can be given as a flag or an environment variable (a `.env`
//! file is honoured). Validation reports every problem at once.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::crypto::{address_from_private_key, is_hex_address, parse_private_key};
use crate::storage::pinning::{PinataConfig, DEFAULT_UPLOAD_URL};

/// Longest accepted nonce lifetime (24 hours)
pub const MAX_NONCE_TTL_MS: u64 = 24 * 60 * 60 * 1000;

/// Raw settings as read from flags and environment
#[derive(Parser, Debug, Clone)]
#[command(name = "filnote-gateway")]
#[command(about = "Signature-gated access to FilNote documents", long_about = None)]
pub struct GatewayArgs {
    /// HTTP port
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Ledger JSON-RPC endpoint
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// FilNote contract address
    #[arg(long, env = "FIL_NOTE_CONTRACT_ADDRESS")]
    pub fil_note_contract_address: Option<String>,

    /// Pinata API token
    #[arg(long, env = "PINATA_JWT", hide_env_values = true)]
    pub pinata_jwt: Option<String>,

    /// Pinata gateway host
    #[arg(long, env = "PINATA_GATEWAY")]
    pub pinata_gateway: Option<String>,

    /// Pinata upload endpoint
    #[arg(long, env = "PINATA_UPLOAD_URL", default_value = DEFAULT_UPLOAD_URL)]
    pub pinata_upload_url: String,

    /// Platform wallet key, source of the envelope key
    #[arg(long, env = "PLATFORM_WALLET_PRIVATE_KEY", hide_env_values = true)]
    pub platform_wallet_private_key: Option<String>,

    /// Per-file upload limit in bytes
    #[arg(long, env = "UPLOAD_MAX_SIZE", default_value_t = 512 * 1024)]
    pub upload_max_size: u64,

    /// Nonce lifetime in milliseconds
    #[arg(long, env = "VERIFY_ID_TTL_MS", default_value_t = 5 * 60 * 1000)]
    pub verify_id_ttl_ms: u64,

    /// Nonce store file
    #[arg(long, env = "NONCE_DB_PATH", default_value = "data/nonces.json")]
    pub nonce_db_path: PathBuf,
}

/// Validated configuration
#[derive(Clone)]
pub struct GatewayConfig {
    pub bind_address: SocketAddr,
    pub rpc_url: Url,
    pub contract_address: String,
    pub pinata: PinataConfig,
    pub platform_key: [u8; 32],
    pub upload_max_size: usize,
    pub nonce_ttl: Duration,
    pub nonce_db_path: PathBuf,
}

impl GatewayConfig {
    /// Load `.env`, read flags and environment, and validate
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_args(GatewayArgs::try_parse()?)
    }

    pub fn from_args(args: GatewayArgs) -> Result<Self> {
        let mut problems = Vec::new();

        let host: Option<IpAddr> = match args.host.parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                problems.push(format!("HOST must be an IP address, got {:?}", args.host));
                None
            }
        };

        if args.port == 0 {
            problems.push("PORT must be a valid port".to_string());
        }

        let rpc_url = match args.rpc_url.as_deref() {
            None | Some("") => {
                problems.push("RPC_URL is required".to_string());
                None
            }
            Some(raw) => match Url::parse(raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    problems.push(format!("RPC_URL must be a valid uri: {}", e));
                    None
                }
            },
        };

        let contract_address = match args.fil_note_contract_address.as_deref() {
            None | Some("") => {
                problems.push("FIL_NOTE_CONTRACT_ADDRESS is required".to_string());
                None
            }
            Some(raw) if !is_hex_address(raw) => {
                problems.push(
                    "FIL_NOTE_CONTRACT_ADDRESS must match ^0x[a-fA-F0-9]{40}$".to_string(),
                );
                None
            }
            Some(raw) => Some(raw.to_string()),
        };

        let pinata_jwt = required(&args.pinata_jwt, "PINATA_JWT", &mut problems);
        let pinata_gateway = required(&args.pinata_gateway, "PINATA_GATEWAY", &mut problems);

        let platform_key = match args.platform_wallet_private_key.as_deref() {
            None | Some("") => {
                problems.push("PLATFORM_WALLET_PRIVATE_KEY is required".to_string());
                None
            }
            Some(raw) => match parse_private_key(raw) {
                Ok(key) if address_from_private_key(&key).is_ok() => Some(key),
                Ok(_) => {
                    problems.push("PLATFORM_WALLET_PRIVATE_KEY is not a valid secp256k1 key".to_string());
                    None
                }
                Err(e) => {
                    problems.push(format!("PLATFORM_WALLET_PRIVATE_KEY: {}", e));
                    None
                }
            },
        };

        if args.upload_max_size == 0 {
            problems.push("UPLOAD_MAX_SIZE must be a positive number".to_string());
        }
        if args.verify_id_ttl_ms == 0 {
            problems.push("VERIFY_ID_TTL_MS must be a positive number".to_string());
        } else if args.verify_id_ttl_ms > MAX_NONCE_TTL_MS {
            problems.push(format!(
                "VERIFY_ID_TTL_MS must be at most {}",
                MAX_NONCE_TTL_MS
            ));
        }

        match (host, rpc_url, contract_address, pinata_jwt, pinata_gateway, platform_key) {
            (Some(host), Some(rpc_url), Some(contract_address), Some(jwt), Some(gateway), Some(platform_key))
                if problems.is_empty() =>
            {
                let mut pinata = PinataConfig::new(jwt, gateway);
                pinata.upload_url = args.pinata_upload_url;

                Ok(Self {
                    bind_address: SocketAddr::new(host, args.port),
                    rpc_url,
                    contract_address,
                    pinata,
                    platform_key,
                    upload_max_size: args.upload_max_size as usize,
                    nonce_ttl: Duration::from_millis(args.verify_id_ttl_ms),
                    nonce_db_path: args.nonce_db_path,
                })
            }
            _ => Err(anyhow!("Config validation error: {}", problems.join(". "))),
        }
    }
}

fn required(value: &Option<String>, name: &str, problems: &mut Vec<String>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            problems.push(format!("{} is required", name));
            None
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind_address", &self.bind_address)
            .field("rpc_url", &self.rpc_url.as_str())
            .field("contract_address", &self.contract_address)
            .field("pinata_gateway", &self.pinata.gateway)
            .field("upload_max_size", &self.upload_max_size)
            .field("nonce_ttl", &self.nonce_ttl)
            .field("nonce_db_path", &self.nonce_db_path)
            .finish_non_exhaustive()
    }
}
