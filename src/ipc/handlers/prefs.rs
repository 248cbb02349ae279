use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::optional_bool;
use crate::ipc::types::{AppState, Request};

fn handle_prefs_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!(state.prefs.get()))
}

fn handle_prefs_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let dark_mode = optional_bool(req, "darkMode");
    let sidebar_collapsed = optional_bool(req, "sidebarCollapsed");

    match state.prefs.update(dark_mode, sidebar_collapsed) {
        Ok(prefs) => ok(&req.id, json!(prefs)),
        Err(e) => err(&req.id, "io_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "prefs.get" => Some(handle_prefs_get(state, req)),
        "prefs.set" => Some(handle_prefs_set(state, req)),
        _ => None,
    }
}
