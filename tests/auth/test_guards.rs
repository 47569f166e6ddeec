// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end guard protocol against in-memory collaborators

use super::common::{Harness, Wallet};
use filnote_gateway::auth::guard::{
    NOT_CREATOR_OR_INVESTOR, NO_NONCE, SIGNATURE_MISMATCH,
};
use filnote_gateway::auth::{AuthError, Credentials, NoteExistsGuard, NoteId};
use filnote_gateway::contracts::Note;
use serde_json::json;

#[tokio::test]
async fn test_issue_sign_authorize_then_replay() {
    let h = Harness::new();
    let auditor = Wallet::random();
    h.oracle.add_auditor(&auditor.address).await;

    let nonce = h.nonces.issue(&auditor.address).await.unwrap();
    let creds = Credentials::new(auditor.address.clone(), auditor.sign(&nonce));

    let caller = h.guard.require_auditor(&creds).await.unwrap();
    assert_eq!(caller.address, auditor.address);

    assert_eq!(
        h.guard.require_auditor(&creds).await,
        Err(AuthError::Unauthorized(NO_NONCE.to_string()))
    );
}

#[tokio::test]
async fn test_uppercase_address_is_same_identity() {
    let h = Harness::new();
    let auditor = Wallet::random();
    h.oracle.add_auditor(&auditor.address).await;

    let shouted = format!("0x{}", auditor.address[2..].to_uppercase());
    let nonce = h.nonces.issue(&shouted).await.unwrap();
    let creds = Credentials::new(shouted, auditor.sign(&nonce));

    let caller = h.guard.require_auditor(&creds).await.unwrap();
    assert_eq!(caller.address, auditor.address);
}

#[tokio::test]
async fn test_someone_elses_signature_is_a_mismatch() {
    let h = Harness::new();
    let victim = Wallet::random();
    let attacker = Wallet::random();

    let nonce = h.nonces.issue(&victim.address).await.unwrap();
    let creds = Credentials::new(victim.address.clone(), attacker.sign(&nonce));

    assert_eq!(
        h.guard.require_auditor(&creds).await,
        Err(AuthError::Unauthorized(SIGNATURE_MISMATCH.to_string()))
    );
}

#[tokio::test]
async fn test_no_nonce_issued() {
    let h = Harness::new();
    let wallet = Wallet::random();
    let creds = Credentials::new(wallet.address.clone(), wallet.sign("guess"));

    assert_eq!(
        h.guard.require_auditor(&creds).await,
        Err(AuthError::Unauthorized(NO_NONCE.to_string()))
    );
}

#[tokio::test]
async fn test_creator_and_investor_allowed_stranger_denied() {
    let h = Harness::new();
    let creator = Wallet::random();
    let investor = Wallet::random();
    let stranger = Wallet::random();
    h.oracle
        .add_note(Note::new(9, &creator.address, Some(&investor.address)))
        .await;
    let note_id = NoteId::new(9).unwrap();

    for wallet in [&creator, &investor] {
        let nonce = h.nonces.issue(&wallet.address).await.unwrap();
        let creds = Credentials::new(wallet.address.clone(), wallet.sign(&nonce));
        let caller = h
            .guard
            .require_creator_or_investor(&creds, note_id)
            .await
            .unwrap();
        assert_eq!(caller.note_id, Some(note_id));
    }

    let nonce = h.nonces.issue(&stranger.address).await.unwrap();
    let creds = Credentials::new(stranger.address.clone(), stranger.sign(&nonce));
    assert_eq!(
        h.guard.require_creator_or_investor(&creds, note_id).await,
        Err(AuthError::Unauthorized(NOT_CREATOR_OR_INVESTOR.to_string()))
    );
    // nonce burned despite the denial
    assert_eq!(h.nonces.consume(&stranger.address).await.unwrap(), None);
}

#[tokio::test]
async fn test_unfunded_note_only_creator() {
    let h = Harness::new();
    let creator = Wallet::random();
    let other = Wallet::random();
    h.oracle.add_note(Note::new(2, &creator.address, None)).await;
    let note_id = NoteId::new(2).unwrap();

    let nonce = h.nonces.issue(&other.address).await.unwrap();
    let creds = Credentials::new(other.address.clone(), other.sign(&nonce));
    assert!(h
        .guard
        .require_creator_or_investor(&creds, note_id)
        .await
        .is_err());
}

#[tokio::test]
async fn test_save_failure_never_fails_authorization() {
    let h = Harness::new();
    let auditor = Wallet::random();
    h.oracle.add_auditor(&auditor.address).await;

    let nonce = h.nonces.issue(&auditor.address).await.unwrap();
    h.backend.fail_saves(true);

    let creds = Credentials::new(auditor.address.clone(), auditor.sign(&nonce));
    assert!(h.guard.require_auditor(&creds).await.is_ok());
}

#[tokio::test]
async fn test_note_guard_rejects_without_ledger_call() {
    let h = Harness::new();
    let guard = NoteExistsGuard::new(h.oracle.clone());

    for raw in [json!(0), json!(-1), json!(2.5), json!("7"), json!(9007199254740992u64)] {
        assert!(matches!(
            guard.check(Some(&raw)).await,
            Err(AuthError::BadRequest(_))
        ));
    }
    assert_eq!(h.oracle.call_count(), 0);
}
