use serde_json::json;
use tracing::info;

use crate::api::ApiClient;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::optional_str;
use crate::ipc::types::{AppState, Request};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "sessionConfigured": state.api.is_some(),
            "apiBaseUrl": state.api.as_ref().map(|c| c.base_url().to_string()),
        }),
    )
}

/// The shell owns token acquisition; this only wires the session. Values
/// omitted here fall back to the environment-seeded settings.
fn handle_session_configure(state: &mut AppState, req: &Request) -> serde_json::Value {
    let base_url = optional_str(req, "baseUrl")
        .or_else(|| state.settings.api_base_url.clone());
    let token = optional_str(req, "token").or_else(|| state.settings.api_token.clone());

    let Some(base_url) = base_url.filter(|v| !v.trim().is_empty()) else {
        return err(&req.id, "bad_params", "missing baseUrl", None);
    };
    let Some(token) = token.filter(|v| !v.trim().is_empty()) else {
        return err(&req.id, "bad_params", "missing token", None);
    };

    match ApiClient::new(&base_url, &token, state.settings.http_timeout_secs) {
        Ok(client) => {
            info!(base_url = client.base_url(), "session configured");
            let result = json!({ "apiBaseUrl": client.base_url() });
            state.api = Some(client);
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, "bad_params", format!("{e}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "session.configure" => Some(handle_session_configure(state, req)),
        _ => None,
    }
}
