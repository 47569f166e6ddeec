// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod kv_store;
pub mod pinning;

// Re-export main types for convenience
pub use kv_store::{
    JsonFileStore, MemoryStore, NonceBackend, NonceRecord, NonceTable, StoreError,
};

pub use pinning::{MemoryPinning, PinataClient, PinataConfig, PinningClient, PinningError};
