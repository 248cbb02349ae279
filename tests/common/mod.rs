#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;

#[derive(Debug, Clone)]
struct Route {
    method: String,
    path: String,
    status: u16,
    body: String,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub bearer: Option<String>,
    pub request_id: Option<String>,
}

/// Minimal canned-response HTTP backend for driving the daemon in tests.
/// Routes added later win, so a test can override a default response.
pub struct StubServer {
    base_url: String,
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub fn start() -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("stub server addr");
        let routes: Arc<Mutex<Vec<Route>>> = Arc::new(Mutex::new(Vec::new()));
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));

        let thread_routes = Arc::clone(&routes);
        let thread_requests = Arc::clone(&requests);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    break;
                };
                handle_connection(stream, &thread_routes, &thread_requests);
            }
        });

        StubServer {
            base_url: format!("http://{}", addr),
            routes,
            requests,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn route(&self, method: &str, path: &str, body: serde_json::Value) {
        self.route_status(method, path, 200, body);
    }

    pub fn route_status(&self, method: &str, path: &str, status: u16, body: serde_json::Value) {
        self.routes.lock().expect("routes lock").push(Route {
            method: method.to_string(),
            path: path.to_string(),
            status,
            body: body.to_string(),
        });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn requests_for(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

fn handle_connection(
    stream: TcpStream,
    routes: &Arc<Mutex<Vec<Route>>>,
    requests: &Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() || request_line.trim().is_empty() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let target = parts.next().unwrap_or("").to_string();
    let path = target.split('?').next().unwrap_or("").to_string();

    let mut content_length = 0usize;
    let mut bearer = None;
    let mut request_id = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() {
            return;
        }
        let line = line.trim_end().to_string();
        if line.is_empty() {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("content-length:") {
            content_length = rest.trim().parse().unwrap_or(0);
        } else if lower.starts_with("authorization:") {
            let value = line.splitn(2, ':').nth(1).unwrap_or("").trim();
            bearer = value
                .strip_prefix("Bearer ")
                .map(|t| t.to_string())
                .or(Some(value.to_string()));
        } else if lower.starts_with("x-request-id:") {
            request_id = Some(line.splitn(2, ':').nth(1).unwrap_or("").trim().to_string());
        }
    }

    let mut body_bytes = vec![0u8; content_length];
    if content_length > 0 && reader.read_exact(&mut body_bytes).is_err() {
        return;
    }
    let body = if body_bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&body_bytes).ok()
    };

    requests.lock().expect("requests lock").push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        body,
        bearer,
        request_id,
    });

    let (status, payload) = {
        let routes = routes.lock().expect("routes lock");
        match routes
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
        {
            Some(route) => (route.status, route.body.clone()),
            None => (
                404,
                json!({ "status": 404, "detail": format!("no route for {} {}", method, path) })
                    .to_string(),
            ),
        }
    };

    let reason = match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        _ => "",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        payload.len(),
        payload
    );
    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

pub fn temp_path(prefix: &str, suffix: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "{}-{}{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos(),
        suffix
    ))
}

pub struct Daemon {
    pub child: Child,
    pub stdin: ChildStdin,
    pub reader: BufReader<ChildStdout>,
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn spawn_daemon(base_url: Option<&str>, prefs_path: &PathBuf) -> Daemon {
    let exe = env!("CARGO_BIN_EXE_aulad");
    let mut cmd = Command::new(exe);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env_remove("AULAD_API_BASE_URL")
        .env_remove("AULAD_API_TOKEN")
        .env("AULAD_PREFS_PATH", prefs_path);
    if let Some(base_url) = base_url {
        cmd.env("AULAD_API_BASE_URL", base_url)
            .env("AULAD_API_TOKEN", "test-token");
    }
    let mut child = cmd.spawn().expect("spawn aulad");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Daemon {
        child,
        stdin,
        reader: BufReader::new(stdout),
    }
}

pub fn read_line_json(daemon: &mut Daemon) -> serde_json::Value {
    let mut line = String::new();
    daemon
        .reader
        .read_line(&mut line)
        .expect("read response line");
    assert!(!line.trim().is_empty(), "empty line from daemon");
    serde_json::from_str(line.trim()).expect("parse daemon json line")
}

pub fn request(
    daemon: &mut Daemon,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(daemon.stdin, "{}", payload).expect("write request");
    daemon.stdin.flush().expect("flush request");

    let value = read_line_json(daemon);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    daemon: &mut Daemon,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(daemon, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

pub fn request_err(
    daemon: &mut Daemon,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(daemon, id, method, params);
    assert!(
        !value.get("ok").and_then(|v| v.as_bool()).unwrap_or(true),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value.get("error").cloned().expect("error object")
}
