// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::prelude::*;

// FilNote contract: only the read-only views the gateway consults
abigen!(
    FilNote,
    r#"[
        {
            "inputs": [{"internalType": "uint256", "name": "noteId", "type": "uint256"}],
            "name": "getNote",
            "outputs": [
                {
                    "components": [
                        {"internalType": "uint256", "name": "id", "type": "uint256"},
                        {"internalType": "address", "name": "creator", "type": "address"},
                        {"internalType": "address", "name": "investor", "type": "address"},
                        {"internalType": "uint256", "name": "targetAmount", "type": "uint256"},
                        {"internalType": "uint256", "name": "platformFeeRateBps", "type": "uint256"},
                        {"internalType": "uint256", "name": "platformFeeAmount", "type": "uint256"},
                        {"internalType": "address", "name": "protocolContract", "type": "address"},
                        {"internalType": "address", "name": "auditor", "type": "address"},
                        {"internalType": "string", "name": "contractHash", "type": "string"},
                        {"internalType": "string", "name": "privacyCertificateHash", "type": "string"},
                        {"internalType": "string", "name": "privacyCredentialsAbridgedHash", "type": "string"},
                        {"internalType": "uint256", "name": "expiryTime", "type": "uint256"},
                        {"internalType": "uint64", "name": "createdAt", "type": "uint64"},
                        {"internalType": "uint32", "name": "borrowingDays", "type": "uint32"},
                        {"internalType": "uint32", "name": "interestRateBps", "type": "uint32"},
                        {"internalType": "uint8", "name": "status", "type": "uint8"}
                    ],
                    "internalType": "struct FilNote.Note",
                    "name": "",
                    "type": "tuple"
                }
            ],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [{"internalType": "address", "name": "account", "type": "address"}],
            "name": "isAuditor",
            "outputs": [{"internalType": "bool", "name": "", "type": "bool"}],
            "stateMutability": "view",
            "type": "function"
        }
    ]"#
);
