// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Route-level tests against the full router with in-memory collaborators

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use filnote_gateway::auth::{NonceStore, DEFAULT_NONCE_TTL};
use filnote_gateway::contracts::{MemoryOracle, Note};
use filnote_gateway::crypto::{address_from_private_key, sign_message};
use filnote_gateway::storage::{MemoryPinning, MemoryStore};
use filnote_gateway::{router, AppState, EnvelopeCipher};
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const PLATFORM_KEY: [u8; 32] = [0x11; 32];
const MAX_UPLOAD: usize = 1024;
const BOUNDARY: &str = "----filnote-test-boundary";

struct TestApp {
    app: Router,
    oracle: Arc<MemoryOracle>,
    pinning: Arc<MemoryPinning>,
}

impl TestApp {
    fn new() -> Self {
        let nonces = Arc::new(NonceStore::new(Arc::new(MemoryStore::new()), DEFAULT_NONCE_TTL));
        let oracle = Arc::new(MemoryOracle::new());
        let pinning = Arc::new(MemoryPinning::new());
        let state = AppState::new(
            nonces,
            oracle.clone(),
            EnvelopeCipher::from_private_key(&PLATFORM_KEY),
            pinning.clone(),
            MAX_UPLOAD,
        );
        Self {
            app: router(state),
            oracle,
            pinning,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Fetch a nonce for `key`'s address and sign it
    async fn credentials(&self, key: &[u8; 32]) -> (String, String) {
        let address = address_from_private_key(key).unwrap();
        let (status, body) = self
            .get(&format!("/verify/get-verify-uuid/{}", address))
            .await;
        assert_eq!(status, StatusCode::OK);
        let nonce = body["data"].as_str().unwrap().to_string();
        (address, sign_message(key, &nonce).unwrap())
    }
}

fn random_key() -> [u8; 32] {
    SigningKey::random(&mut OsRng).to_bytes().into()
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, content_type, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(parts: &[Part]) -> Request<Body> {
    Request::post("/verify/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"]["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["version"]["features"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "replay-protection"));
}

#[tokio::test]
async fn test_nonce_endpoint() {
    let app = TestApp::new();

    let (status, body) = app.get("/verify/get-verify-uuid/0x1234").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["message"], "address must be an Ethereum address");
    assert!(body["data"].is_null());

    let address = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0";
    let (status, first) = app
        .get(&format!("/verify/get-verify-uuid/{}", address))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], 200);
    assert_eq!(first["message"], "success");
    assert_eq!(first["data"].as_str().unwrap().len(), 64);

    let (_, second) = app
        .get(&format!("/verify/get-verify-uuid/{}", address.to_lowercase()))
        .await;
    assert_eq!(first["data"], second["data"]);
}

#[tokio::test]
async fn test_encrypt_then_decrypt_as_creator() {
    let app = TestApp::new();
    let creator = random_key();
    let creator_address = address_from_private_key(&creator).unwrap();
    app.oracle.add_note(Note::new(5, &creator_address, None)).await;

    let (status, body) = app
        .post_json("/encrypt/privacy-certificate", json!({"hashUrl": "bafyCertificate"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["originalHash"], "bafyCertificate");
    let envelope = body["data"]["encryptedHash"].as_str().unwrap().to_string();

    let (address, signature) = app.credentials(&creator).await;
    let (status, body) = app
        .post_json(
            "/encrypt/decrypt-privacy-certificate",
            json!({
                "encryptedHash": envelope,
                "noteId": 5,
                "address": address,
                "signature": signature
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["decryptedHash"], "bafyCertificate");
}

#[tokio::test]
async fn test_decrypt_denied_for_stranger() {
    let app = TestApp::new();
    let creator = address_from_private_key(&random_key()).unwrap();
    app.oracle.add_note(Note::new(5, &creator, None)).await;

    let (address, signature) = app.credentials(&random_key()).await;
    let (status, body) = app
        .post_json(
            "/encrypt/decrypt-privacy-certificate",
            json!({
                "encryptedHash": "A".repeat(44),
                "noteId": 5,
                "address": address,
                "signature": signature
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "You are not the creator or investor of this note");
}

#[tokio::test]
async fn test_decrypt_rejects_bad_note_ids() {
    let app = TestApp::new();

    for (note_id, message) in [
        (json!(0), "Invalid note ID format"),
        (json!(9007199254740992u64), "Note ID is too large"),
        (Value::Null, "Note ID is required"),
        (json!(77), "Note does not exist"),
    ] {
        let (status, body) = app
            .post_json(
                "/encrypt/decrypt-privacy-certificate",
                json!({"encryptedHash": "A".repeat(44), "noteId": note_id}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn test_decrypt_tampered_envelope() {
    let app = TestApp::new();
    let creator = random_key();
    app.oracle
        .add_note(Note::new(1, &address_from_private_key(&creator).unwrap(), None))
        .await;

    let (address, signature) = app.credentials(&creator).await;
    let (status, body) = app
        .post_json(
            "/encrypt/decrypt-privacy-certificate",
            json!({
                "encryptedHash": "B".repeat(64),
                "noteId": 1,
                "address": address,
                "signature": signature
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Decryption failed");
}

#[tokio::test]
async fn test_upload_as_auditor() {
    let app = TestApp::new();
    let auditor = random_key();
    app.oracle
        .add_auditor(&address_from_private_key(&auditor).unwrap())
        .await;

    let (address, signature) = app.credentials(&auditor).await;
    let (status, body) = app
        .send(upload_request(&[
            Part::Text("address", &address),
            Part::Text("signature", &signature),
            Part::Text("jsonData", r#"{"name":"Alice"}"#),
            Part::File("contract", "contract.pdf", "application/pdf", b"%PDF-contract"),
            Part::File("privacyCertificate", "cert.pdf", "application/pdf", b"%PDF-cert"),
        ]))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let data = &body["data"];
    let contract_cid = data["contractHash"].as_str().unwrap();
    assert_eq!(
        app.pinning.get(contract_cid).await.unwrap().1,
        b"%PDF-contract".to_vec()
    );

    let cipher = EnvelopeCipher::from_private_key(&PLATFORM_KEY);
    let cert_cid = cipher
        .decrypt(data["encryptedPrivacyCertificateHash"].as_str().unwrap())
        .unwrap();
    assert_eq!(app.pinning.get(&cert_cid).await.unwrap().0, "cert.pdf");

    let preview_cid = data["privacyCredentialsAbridgedHash"].as_str().unwrap();
    let (name, bytes) = app.pinning.get(preview_cid).await.unwrap();
    assert_eq!(name, "privacy-credentials.json");
    assert_eq!(
        serde_json::from_slice::<Value>(&bytes).unwrap(),
        json!({"name": "Alice"})
    );
    assert_eq!(app.pinning.len().await, 3);
}

#[tokio::test]
async fn test_upload_denied_for_non_auditor() {
    let app = TestApp::new();
    let (address, signature) = app.credentials(&random_key()).await;

    let (status, body) = app
        .send(upload_request(&[
            Part::Text("address", &address),
            Part::Text("signature", &signature),
            Part::File("contract", "contract.pdf", "application/pdf", b"%PDF"),
        ]))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "You are not an auditor");
    assert!(app.pinning.is_empty().await);
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = TestApp::new();
    let oversized = vec![b'x'; MAX_UPLOAD + 1];

    let (status, body) = app
        .send(upload_request(&[Part::File(
            "contract",
            "contract.pdf",
            "application/pdf",
            &oversized,
        )]))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["message"], "File too large");
}

#[tokio::test]
async fn test_upload_pinning_auth_failure() {
    let app = TestApp::new();
    let auditor = random_key();
    app.oracle
        .add_auditor(&address_from_private_key(&auditor).unwrap())
        .await;
    app.pinning.reject_auth(true);

    let (address, signature) = app.credentials(&auditor).await;
    let (status, _) = app
        .send(upload_request(&[
            Part::Text("address", &address),
            Part::Text("signature", &signature),
            Part::File("contract", "contract.pdf", "application/pdf", b"%PDF"),
        ]))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
