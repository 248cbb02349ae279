use serde_json::json;
use tracing::warn;

use crate::api::{ApiClient, ApiError};
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

pub fn required_f64(req: &Request, key: &str) -> Result<f64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_f64(req: &Request, key: &str) -> Option<f64> {
    req.params.get(key).and_then(|v| v.as_f64())
}

pub fn optional_bool(req: &Request, key: &str) -> Option<bool> {
    req.params.get(key).and_then(|v| v.as_bool())
}

/// All remote methods require a configured session first.
pub fn api_client<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a ApiClient, serde_json::Value> {
    state
        .api
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_session", "configure a session first", None))
}

/// Map a backend failure onto the error envelope. Nothing is retried; the
/// shell keeps its form state and the prior snapshot.
pub fn api_failure(req_id: &str, e: ApiError) -> serde_json::Value {
    warn!(code = e.code(), error = %e, "backend call failed");
    match &e {
        ApiError::Rejected { status, .. } => err(
            req_id,
            e.code(),
            e.to_string(),
            Some(json!({ "status": status })),
        ),
        _ => err(req_id, e.code(), e.to_string(), None),
    }
}
