// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request as AxumRequest, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use anchor_kernel::{ConsensusTimestamp, Hash256, ProofParams};

use crate::api::*;
use crate::config::NodeConfig;
use crate::errors::AnchorError;
use crate::orchestrator::{SubmitOutcome, Submitter};
use crate::services::{AppendLog, CallReceipt, Ledger};
use crate::verifier::{VerificationReport, Verifier};

pub type SharedLog = Arc<dyn AppendLog + Send + Sync>;
pub type SharedLedger = Arc<dyn Ledger + Send + Sync>;

/// Services shared by every handler. The devnet gateway routes expose
/// `log` and `ledger` directly; the proof routes drive them through a
/// submitter or verifier.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<NodeConfig>,
    pub log: SharedLog,
    pub ledger: SharedLedger,
}

impl AppState {
    pub fn new(config: NodeConfig, log: SharedLog, ledger: SharedLedger) -> Self {
        Self { config: Arc::new(config), log, ledger }
    }

    fn submitter(&self) -> Submitter<SharedLog, SharedLedger> {
        Submitter::new(&self.config, self.log.clone(), self.ledger.clone())
    }

    fn verifier(&self) -> Verifier<SharedLog, SharedLedger> {
        Verifier::new(&self.config, self.log.clone(), self.ledger.clone())
    }
}

/// Run synchronous service code on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, AnchorError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AnchorError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AnchorError::Internal(format!("blocking task failed: {}", e)))?
}

async fn auth_guard(
    State(token): State<Arc<Option<String>>>,
    req: AxumRequest,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(token_str) = &*token {
        let provided = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.strip_prefix("Bearer "));

        return match provided {
            Some(p) if p == token_str => Ok(next.run(req).await),
            _ => Err(StatusCode::UNAUTHORIZED),
        };
    }
    Ok(next.run(req).await)
}

pub fn build_router(state: AppState) -> Router {
    let auth_token = state.config.auth_token.clone();

    let mut app = Router::new()
        // Devnet gateway
        .route("/v1/topics/:topic/messages", post(append_message))
        .route("/v1/topics/:topic/messages/:timestamp", get(read_message))
        .route("/v1/contracts/:contract/call", post(call_contract))
        .route("/v1/transactions/:tx", get(get_transaction))
        // Proofs
        .route("/v1/proofs", post(submit_proof))
        .route("/v1/proofs/:tx/verify", get(verify_proof))
        // Observability
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health))
        .with_state(state);

    if let Some(token) = auth_token {
        tracing::info!("Auth Enabled: Bearer token required");
        app = app.layer(from_fn_with_state(Arc::new(Some(token)), auth_guard));
    } else {
        tracing::warn!("Auth Disabled: No token configured");
    }

    app.layer(TraceLayer::new_for_http())
}

async fn append_message(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    Json(req): Json<AppendMessageRequest>,
) -> Result<Json<AppendMessageResponse>, AnchorError> {
    let message = decode_bytes("message", &req.message)?;
    let log = state.log.clone();
    let topic_id = topic.clone();
    let receipt = run_blocking(move || log.append(&topic_id, &message)).await?;

    Ok(Json(AppendMessageResponse {
        topic_id: topic,
        sequence_number: receipt.sequence_number,
        consensus_timestamp: receipt.timestamp,
    }))
}

async fn read_message(
    State(state): State<AppState>,
    Path((topic, timestamp)): Path<(String, String)>,
) -> Result<Json<TopicMessageResponse>, AnchorError> {
    let ts: ConsensusTimestamp = timestamp.parse()?;
    let log = state.log.clone();
    let topic_id = topic.clone();
    let message = run_blocking(move || log.read_at(&topic_id, ts))
        .await?
        .ok_or_else(|| AnchorError::NotFound(format!("no message at {}/{}", topic, ts)))?;

    Ok(Json(TopicMessageResponse {
        topic_id: topic,
        consensus_timestamp: ts,
        message: encode_bytes(&message),
    }))
}

async fn call_contract(
    State(state): State<AppState>,
    Path(contract): Path<String>,
    Json(req): Json<ContractCallRequest>,
) -> Result<Json<CallReceipt>, AnchorError> {
    let args = decode_bytes("args", &req.args)?;
    let ledger = state.ledger.clone();
    let receipt = run_blocking(move || ledger.call(&contract, &req.function, &args)).await?;
    Ok(Json(receipt))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(tx): Path<String>,
) -> Result<Json<CallReceipt>, AnchorError> {
    let ledger = state.ledger.clone();
    let lookup = tx.clone();
    run_blocking(move || ledger.transaction(&lookup))
        .await?
        .map(Json)
        .ok_or_else(|| AnchorError::NotFound(format!("transaction {}", tx)))
}

async fn submit_proof(
    State(state): State<AppState>,
    Json(params): Json<ProofParams>,
) -> Result<Json<SubmitOutcome>, AnchorError> {
    let submitter = state.submitter();
    let outcome = run_blocking(move || submitter.submit(params)).await?;
    Ok(Json(outcome))
}

async fn verify_proof(
    State(state): State<AppState>,
    Path(tx): Path<String>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerificationReport>, AnchorError> {
    let expected = query
        .expected
        .as_deref()
        .map(|h| h.parse::<Hash256>())
        .transpose()?;
    let verifier = state.verifier();
    let report = run_blocking(move || verifier.verify(&tx, expected)).await?;
    Ok(Json(report))
}

async fn metrics_handler() -> String {
    crate::telemetry::get_metrics()
}

async fn health() -> &'static str {
    "ok"
}
