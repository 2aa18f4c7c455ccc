// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use anchor_node::api::{encode_bytes, AppendMessageResponse, TopicMessageResponse};
use anchor_node::config::NodeConfig;
use anchor_node::server::{build_router, AppState};
use anchor_node::services::{InMemoryLedger, InMemoryLog};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot

fn app_with(config: NodeConfig) -> Router {
    let log = Arc::new(InMemoryLog::new(config.max_message_bytes));
    let ledger = Arc::new(InMemoryLedger::new(config.contract_id.clone(), config.operator_id.clone()));
    build_router(AppState::new(config, log, ledger))
}

fn proof_params(signer: &str) -> Value {
    json!({
        "domain": "light-mix",
        "operator": "add-v1",
        "inputs": ["0.0.4802", "0.0.4801"],
        "output": {"token": "0.0.4803", "amount": 1},
        "rule": {"contract": "0.0.5005", "contractVersion": "v1"},
        "signer": signer,
        "logTopic": "0.0.6006",
        "timestamp": "2025-03-01T12:00:00.000Z"
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_submit_and_verify_over_http() {
    let app = app_with(NodeConfig::default());

    let response = app.clone().oneshot(post_json("/v1/proofs", &proof_params("0.0.1001"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["replayed"], false);
    let tx = outcome["receipt"]["transactionId"].as_str().unwrap().to_string();
    let proof_hash = outcome["hashes"]["proofHash"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get(&format!("/v1/proofs/{}/verify?expected={}", tx, proof_hash)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["pass"], true);
    assert_eq!(report["storedCanonical"], true);
    assert_eq!(report["hashes"]["logStored"], proof_hash.as_str());

    // Same record again resolves as a replay.
    let response = app.oneshot(post_json("/v1/proofs", &proof_params("0.0.1001"))).await.unwrap();
    let replay = body_json(response).await;
    assert_eq!(replay["replayed"], true);
    assert_eq!(replay["receipt"]["transactionId"], tx.as_str());
}

#[tokio::test]
async fn test_wrong_expected_hash_reports_mismatch() {
    let app = app_with(NodeConfig::default());
    let outcome = body_json(app.clone().oneshot(post_json("/v1/proofs", &proof_params("0.0.1001"))).await.unwrap()).await;
    let tx = outcome["receipt"]["transactionId"].as_str().unwrap().to_string();

    let wrong = "ab".repeat(32);
    let report = body_json(
        app.oneshot(get(&format!("/v1/proofs/{}/verify?expected=0x{}", tx, wrong)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(report["pass"], false);
    let pairs: Vec<&str> = report["mismatches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["pair"].as_str().unwrap())
        .collect();
    assert_eq!(pairs, vec!["event-local", "log-local"]);
}

#[tokio::test]
async fn test_error_kinds_map_to_status_codes() {
    let app = app_with(NodeConfig::default());

    let oversize = app
        .clone()
        .oneshot(post_json("/v1/proofs", &proof_params(&"x".repeat(2000))))
        .await
        .unwrap();
    assert_eq!(oversize.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(oversize).await["kind"], "PayloadTooLargeError");

    let unknown = app.clone().oneshot(get("/v1/proofs/0.0.1001@1.000000001/verify")).await.unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(unknown).await["kind"], "NotFoundError");

    let bad_expected = app.oneshot(get("/v1/proofs/tx/verify?expected=xyz")).await.unwrap();
    assert_eq!(bad_expected.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gateway_routes_round_trip() {
    let app = app_with(NodeConfig::default());

    let response = app
        .clone()
        .oneshot(post_json("/v1/topics/0.0.6006/messages", &json!({ "message": encode_bytes(b"{\"a\":1}") })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let appended: AppendMessageResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(appended.sequence_number, 1);

    let response = app
        .clone()
        .oneshot(get(&format!("/v1/topics/0.0.6006/messages/{}", appended.consensus_timestamp)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let msg: TopicMessageResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(msg.message, encode_bytes(b"{\"a\":1}"));

    let missing = app.clone().oneshot(get("/v1/topics/0.0.6006/messages/1.000000001")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let call = app
        .oneshot(post_json("/v1/contracts/0.0.5005/call", &json!({ "function": "burn", "args": "" })))
        .await
        .unwrap();
    assert_eq!(call.status(), StatusCode::OK);
    assert_eq!(body_json(call).await["status"], "INVALID_SELECTOR");
}

#[tokio::test]
async fn test_auth_guard() {
    let mut config = NodeConfig::default();
    config.auth_token = Some("s3cret".into());
    let app = app_with(config);

    let denied = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/health")
        .header("authorization", "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(wrong).await.unwrap().status(), StatusCode::UNAUTHORIZED);

    let allowed = Request::builder()
        .uri("/health")
        .header("authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.oneshot(allowed).await.unwrap().status(), StatusCode::OK);
}
