// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    decrypt_handler, encrypt_handler, get_verify_uuid_handler, health_handler, upload_handler,
};
use crate::auth::{AuthorizationGuard, NonceStore, NoteExistsGuard};
use crate::contracts::RoleOracle;
use crate::crypto::EnvelopeCipher;
use crate::storage::PinningClient;

/// Room for the non-file multipart fields on top of the two files
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub nonces: Arc<NonceStore>,
    pub guard: AuthorizationGuard,
    pub note_guard: NoteExistsGuard,
    pub cipher: Arc<EnvelopeCipher>,
    pub pinning: Arc<dyn PinningClient>,
    pub upload_max_size: usize,
}

impl AppState {
    pub fn new(
        nonces: Arc<NonceStore>,
        oracle: Arc<dyn RoleOracle>,
        cipher: EnvelopeCipher,
        pinning: Arc<dyn PinningClient>,
        upload_max_size: usize,
    ) -> Self {
        Self {
            guard: AuthorizationGuard::new(nonces.clone(), oracle.clone()),
            note_guard: NoteExistsGuard::new(oracle),
            nonces,
            cipher: Arc::new(cipher),
            pinning,
            upload_max_size,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.upload_max_size * 2 + FORM_OVERHEAD_BYTES;

    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Challenge issuance
        .route("/verify/get-verify-uuid/:address", get(get_verify_uuid_handler))
        // Auditor uploads
        .route("/verify/upload", post(upload_handler))
        // Envelopes
        .route("/encrypt/privacy-certificate", post(encrypt_handler))
        .route("/encrypt/decrypt-privacy-certificate", post(decrypt_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
