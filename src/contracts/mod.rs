// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod oracle;
pub mod types;

pub use oracle::{FilNoteOracle, MemoryOracle, Note, OracleError, RoleOracle};
pub use types::FilNote;
