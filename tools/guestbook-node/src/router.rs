use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use guestbook_common::account::AccountId;
use guestbook_common::call::{QueryRequest, QueryResponse, SubmitRequest, SubmitResponse};
use guestbook_common::replica::GuestbookDelta;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::error::NodeError;
use crate::runtime::Runtime;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    contract_id: AccountId,
    block_height: u64,
}

/// Raw key bytes, the same bytes the contract takes as parameters.
#[derive(Serialize, Deserialize)]
struct HostKeyResponse {
    host_key: [u8; 32],
}

#[derive(Deserialize)]
struct DeltaParams {
    #[serde(default)]
    from: u64,
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn query_handler(
    State(runtime): State<Arc<Runtime>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, NodeError> {
    runtime.query(request).await.map(Json)
}

async fn transactions_handler(
    State(runtime): State<Arc<Runtime>>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, NodeError> {
    runtime.submit(request).await.map(Json)
}

async fn health_handler(
    State(runtime): State<Arc<Runtime>>,
) -> Result<Json<HealthResponse>, NodeError> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        contract_id: runtime.contract_id().clone(),
        block_height: runtime.store().block_height()?,
    }))
}

async fn host_key_handler(State(runtime): State<Arc<Runtime>>) -> Json<HostKeyResponse> {
    Json(HostKeyResponse {
        host_key: runtime.host_public_key().to_bytes(),
    })
}

async fn replica_delta_handler(
    State(runtime): State<Arc<Runtime>>,
    Query(params): Query<DeltaParams>,
) -> Result<Json<GuestbookDelta>, NodeError> {
    runtime.replica_delta(params.from).map(Json)
}

// ─── Router ──────────────────────────────────────────────────────────────────

pub fn build_router(runtime: Arc<Runtime>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/query", post(query_handler))
        .route("/transactions", post(transactions_handler))
        .route("/health", get(health_handler))
        .route("/replica/key", get(host_key_handler))
        .route("/replica/delta", get(replica_delta_handler))
        .layer(cors)
        .with_state(runtime)
}
