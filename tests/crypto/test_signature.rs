// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! EIP-191 recovery against independently produced signatures

use filnote_gateway::crypto::{recover_signer, sign_message, verify_signer, CryptoError};
use k256::{ecdsa::SigningKey, elliptic_curve::sec1::ToEncodedPoint};
use rand::rngs::OsRng;
use tiny_keccak::{Hasher, Keccak};

/// Helper to create Ethereum address from public key using Keccak-256
fn pubkey_to_address(public_key: &k256::PublicKey) -> String {
    let encoded_point = public_key.to_encoded_point(false);
    let mut hasher = Keccak::v256();
    let mut hash = [0u8; 32];
    hasher.update(&encoded_point.as_bytes()[1..]);
    hasher.finalize(&mut hash);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Sign the way a wallet's personal_sign does, without using the crate
fn wallet_sign(key: &SigningKey, message: &str) -> String {
    let prefixed = format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message);
    let mut hasher = Keccak::v256();
    let mut digest = [0u8; 32];
    hasher.update(prefixed.as_bytes());
    hasher.finalize(&mut digest);

    let (signature, recovery_id) = key.sign_prehash_recoverable(&digest).unwrap();
    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte() + 27);
    format!("0x{}", hex::encode(bytes))
}

#[test]
fn test_recovers_wallet_signature() {
    let key = SigningKey::random(&mut OsRng);
    let expected = pubkey_to_address(&k256::PublicKey::from(key.verifying_key()));

    let nonce = "3f1c9a0e5b7d42e8a6c1f0b9d8e7a6c5b4a3f2e1d0c9b8a7f6e5d4c3b2a1f0e9";
    let signature = wallet_sign(&key, nonce);

    assert_eq!(recover_signer(nonce, &signature).unwrap(), expected);
    assert!(verify_signer(&expected.to_uppercase().replace("0X", "0x"), nonce, &signature));
}

#[test]
fn test_crate_signature_matches_wallet_signature() {
    let key = SigningKey::random(&mut OsRng);
    let raw: [u8; 32] = key.to_bytes().into();

    // RFC 6979 signing is deterministic
    assert_eq!(sign_message(&raw, "hello").unwrap(), wallet_sign(&key, "hello"));
}

#[test]
fn test_signature_over_other_message_does_not_verify() {
    let key = SigningKey::random(&mut OsRng);
    let address = pubkey_to_address(&k256::PublicKey::from(key.verifying_key()));
    let signature = wallet_sign(&key, "nonce-1");

    assert!(!verify_signer(&address, "nonce-2", &signature));
}

#[test]
fn test_malformed_signatures() {
    let zeros = format!("0x{}", "00".repeat(65));
    for bad in ["", "0x", "0xzz", "0x1234", zeros.as_str()] {
        assert!(
            matches!(recover_signer("m", bad), Err(CryptoError::InvalidSignature { .. })),
            "accepted {:?}",
            bad
        );
    }
}

#[test]
fn test_only_one_hex_prefix_is_stripped() {
    let key = SigningKey::random(&mut OsRng);
    let signature = wallet_sign(&key, "nonce");
    let unprefixed = &signature[2..];

    assert!(recover_signer("nonce", unprefixed).is_ok());
    assert!(matches!(
        recover_signer("nonce", &format!("0x0x{}", unprefixed)),
        Err(CryptoError::InvalidSignature { .. })
    ));
}
