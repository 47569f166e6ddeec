// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod envelope;
pub mod signing;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// FilNote gateway CLI
#[derive(Parser, Debug)]
#[command(name = "filnote-cli")]
#[command(version)]
#[command(about = "Client and operator tools for the FilNote gateway", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign an issued nonce the way a wallet would
    SignNonce(signing::SignNonceArgs),

    /// Print the address controlled by a private key
    Address(signing::AddressArgs),

    /// Encrypt a content reference with the platform key
    Encrypt(envelope::EncryptArgs),

    /// Decrypt an envelope with the platform key
    Decrypt(envelope::DecryptArgs),
}

/// Execute CLI command, returning the text to print
pub fn execute(cli: Cli) -> Result<String> {
    match cli.command {
        Commands::SignNonce(args) => signing::sign_nonce(args),
        Commands::Address(args) => signing::show_address(args),
        Commands::Encrypt(args) => envelope::encrypt(args),
        Commands::Decrypt(args) => envelope::decrypt(args),
    }
}
