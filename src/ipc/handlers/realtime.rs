use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::realtime;

/// The shell forwards each push event it receives; the reply tells it what
/// toast to show and which resource to re-fetch. Stateless by design.
fn handle_dispatch(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let event = match required_str(req, "event") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let payload = req
        .params
        .get("payload")
        .cloned()
        .unwrap_or_else(|| json!({}));
    let notification = realtime::resolve(&event, &payload);
    ok(&req.id, json!(notification))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "realtime.dispatch" => Some(handle_dispatch(state, req)),
        _ => None,
    }
}
