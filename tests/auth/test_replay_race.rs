// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Concurrent presentation of one signature

use super::common::{Harness, Wallet};
use filnote_gateway::auth::Credentials;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_replays_authorize_at_most_once() {
    let h = Harness::new();
    let auditor = Wallet::random();
    h.oracle.add_auditor(&auditor.address).await;

    let nonce = h.nonces.issue(&auditor.address).await.unwrap();
    let creds = Credentials::new(auditor.address.clone(), auditor.sign(&nonce));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let guard = h.guard.clone();
        let creds = creds.clone();
        handles.push(tokio::spawn(async move {
            guard.require_auditor(&creds).await.is_ok()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
}
