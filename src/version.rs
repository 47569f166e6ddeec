// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the FilNote gateway

/// Full version string with feature description
pub const VERSION: &str = "v1.2.0-nonce-compare-and-delete-2025-10-20";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-10-20";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "nonce-challenge",
    "eip191-recovery",
    "replay-protection",
    "auditor-guard",
    "creator-investor-guard",
    "note-existence-guard",
    "aes-256-gcm-envelopes",
    "ipfs-pinning",
    "legacy-nonce-migration",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("FilNote Gateway {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
