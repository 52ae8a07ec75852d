//! RPC request handlers.
//!
//! Every action is a `POST /` with a JSON body carrying an `action` field,
//! the way node RPC clients already talk to work peers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use powrace_coordinator::WorkService;
use powrace_types::{BlockHash, Difficulty, WorkNonce};
use powrace_work::{validate_work, work_value};

use crate::error::RpcError;

// ── Work generation ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WorkGenerateRequest {
    pub hash: BlockHash,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkGenerateResponse {
    pub work: WorkNonce,
    /// The value the returned work actually achieves.
    pub difficulty: Difficulty,
    pub hash: BlockHash,
}

// ── Work validation ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WorkValidateRequest {
    pub hash: BlockHash,
    pub work: WorkNonce,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkValidateResponse {
    pub valid: bool,
    pub value: Difficulty,
}

// ── Work cancellation ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WorkCancelRequest {
    pub hash: BlockHash,
}

// ── Dispatch ─────────────────────────────────────────────────────────────

pub async fn dispatch(
    State(service): State<Arc<WorkService>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, RpcError> {
    let Json(body) = body.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let action = body
        .get("action")
        .and_then(Value::as_str)
        .ok_or(RpcError::MissingAction)?
        .to_string();
    debug!(%action, "rpc request");

    let response = match action.as_str() {
        "work_generate" => to_value(work_generate(&service, parse(body)?).await)?,
        "work_validate" => to_value(work_validate(&service, parse(body)?))?,
        "work_cancel" => work_cancel(&service, parse(body)?),
        _ => return Err(RpcError::UnknownAction(action)),
    };
    Ok(Json(response))
}

pub async fn metrics(State(service): State<Arc<WorkService>>) -> Result<impl IntoResponse, RpcError> {
    let text = service.metrics().render()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text))
}

async fn work_generate(service: &WorkService, req: WorkGenerateRequest) -> WorkGenerateResponse {
    let work = service.generate(&req.hash, req.difficulty).await;
    WorkGenerateResponse {
        work,
        difficulty: Difficulty(work_value(&req.hash, work.0)),
        hash: req.hash,
    }
}

fn work_validate(service: &WorkService, req: WorkValidateRequest) -> WorkValidateResponse {
    let threshold = req
        .difficulty
        .unwrap_or_else(|| service.config().network.base_difficulty());
    WorkValidateResponse {
        valid: validate_work(&req.hash, req.work, threshold),
        value: Difficulty(work_value(&req.hash, req.work.0)),
    }
}

/// Forwarded to every peer. Local computation already under way finishes regardless.
fn work_cancel(service: &WorkService, req: WorkCancelRequest) -> Value {
    service.cancel(&req.hash);
    json!({})
}

fn parse<T: DeserializeOwned>(body: Value) -> Result<T, RpcError> {
    serde_json::from_value(body).map_err(|e| RpcError::InvalidRequest(e.to_string()))
}

fn to_value<T: Serialize>(response: T) -> Result<Value, RpcError> {
    serde_json::to_value(response).map_err(|e| RpcError::InvalidRequest(e.to_string()))
}
