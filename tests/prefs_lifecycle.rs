mod common;

use common::{read_line_json, request_ok, spawn_daemon, temp_path};
use serde_json::json;

#[test]
fn prefs_default_then_persist_and_survive_restart() {
    let prefs_path = temp_path("aulad-prefs-restart", ".json");

    {
        let mut daemon = spawn_daemon(None, &prefs_path);
        let prefs = request_ok(&mut daemon, "1", "prefs.get", json!({}));
        assert_eq!(prefs.get("darkMode").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(
            prefs.get("sidebarCollapsed").and_then(|v| v.as_bool()),
            Some(false)
        );

        let updated = request_ok(
            &mut daemon,
            "2",
            "prefs.set",
            json!({ "darkMode": true, "sidebarCollapsed": true }),
        );
        assert_eq!(updated.get("darkMode").and_then(|v| v.as_bool()), Some(true));
        // The change event follows the response on the same channel.
        let push = read_line_json(&mut daemon);
        assert_eq!(
            push.get("event").and_then(|v| v.as_str()),
            Some("prefs.changed")
        );
        assert_eq!(
            push.get("data")
                .and_then(|d| d.get("darkMode"))
                .and_then(|v| v.as_bool()),
            Some(true)
        );
    }

    // A fresh process reads the persisted state back.
    let mut daemon = spawn_daemon(None, &prefs_path);
    let prefs = request_ok(&mut daemon, "1", "prefs.get", json!({}));
    assert_eq!(prefs.get("darkMode").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        prefs.get("sidebarCollapsed").and_then(|v| v.as_bool()),
        Some(true)
    );
    std::fs::remove_file(&prefs_path).expect("cleanup");
}

#[test]
fn unchanged_prefs_emit_no_push_line() {
    let prefs_path = temp_path("aulad-prefs-nochange", ".json");
    let mut daemon = spawn_daemon(None, &prefs_path);

    request_ok(&mut daemon, "1", "prefs.set", json!({ "darkMode": false }));
    // If a stray push line had been emitted, this request helper would read
    // it instead of the health response and fail on the id check.
    let health = request_ok(&mut daemon, "2", "health", json!({}));
    assert!(health.get("version").is_some());
}
