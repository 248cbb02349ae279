mod api;
mod calc;
mod config;
mod export;
mod ipc;
mod models;
mod prefs;
mod realtime;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // stdout carries the protocol; diagnostics go to stderr only.
    let filter = EnvFilter::try_from_env("AULAD_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = config::Settings::load();
    let mut prefs = prefs::PrefsStore::load(&settings.prefs_path);

    // Push lines are queued while a request is handled and flushed after
    // its response, so the shell always reads the reply first.
    let pushes: Rc<RefCell<VecDeque<serde_json::Value>>> = Rc::new(RefCell::new(VecDeque::new()));
    let sink = Rc::clone(&pushes);
    prefs.subscribe(move |p| {
        sink.borrow_mut()
            .push_back(json!({ "event": "prefs.changed", "data": p }));
    });

    let api = match (&settings.api_base_url, &settings.api_token) {
        (Some(base_url), Some(token)) => {
            match api::ApiClient::new(base_url, token, settings.http_timeout_secs) {
                Ok(client) => {
                    info!(base_url = client.base_url(), "session configured from environment");
                    Some(client)
                }
                Err(e) => {
                    warn!(error = %e, "ignoring invalid environment session");
                    None
                }
            }
        }
        _ => None,
    };

    let mut state = ipc::AppState {
        settings,
        api,
        prefs,
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id; ignore.
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        for push in pushes.borrow_mut().drain(..) {
            if let Ok(text) = serde_json::to_string(&push) {
                let _ = writeln!(stdout, "{}", text);
            }
        }
        let _ = stdout.flush();
    }
}
