// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use filnote_gateway::{
    api::{start_server, AppState},
    auth::NonceStore,
    config::GatewayConfig,
    contracts::FilNoteOracle,
    crypto::EnvelopeCipher,
    storage::{JsonFileStore, NonceBackend, PinataClient},
};
use std::{env, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting {}", filnote_gateway::version::get_version_string());
    info!("Build: {}", filnote_gateway::version::VERSION);

    let config = GatewayConfig::load()?;
    info!("Configuration loaded: {:?}", config);

    // Nonce store
    let backend = JsonFileStore::new(&config.nonce_db_path);
    backend
        .load()
        .await
        .with_context(|| format!("opening nonce store {:?}", backend.path()))?;
    let nonces = Arc::new(NonceStore::new(Arc::new(backend), config.nonce_ttl));
    let pruned = nonces.prune_expired().await?;
    info!("Nonce store ready ({} expired entries pruned)", pruned);

    // Ledger
    let oracle = FilNoteOracle::new(config.rpc_url.as_str(), &config.contract_address)
        .context("connecting to FilNote contract")?;
    info!("FilNote contract at {:?}", oracle.contract_address());

    // Envelope key, derived once
    let cipher = EnvelopeCipher::from_private_key(&config.platform_key);

    // Pinning
    let pinning = PinataClient::new(config.pinata.clone())?;

    let state = AppState::new(
        nonces,
        Arc::new(oracle),
        cipher,
        Arc::new(pinning),
        config.upload_max_size,
    );

    start_server(config.bind_address, state).await
}
