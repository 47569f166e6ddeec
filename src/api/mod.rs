// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod requests;

pub use errors::{ApiError, ApiResponse, ErrorResponse};
pub use handlers::HealthResponse;
pub use http_server::{router, start_server, AppState};
pub use requests::{
    DecryptHashRequest, DecryptHashResponse, EncryptHashRequest, EncryptHashResponse,
    UploadForm, UploadRequest, UploadResponse, UploadedFile,
};
