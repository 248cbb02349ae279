mod common;

use common::{request_ok, spawn_daemon, temp_path};
use serde_json::json;

#[test]
fn known_events_map_to_toast_and_refresh_target() {
    let prefs = temp_path("aulad-rt-known", ".json");
    let mut daemon = spawn_daemon(None, &prefs);

    let cases = [
        ("entrega_nueva", json!({ "id_tarea": "a1" }), "submissions", Some("a1")),
        ("entrega_actualizada", json!({ "id_tarea": "a1" }), "submissions", Some("a1")),
        ("tarea_entregada_docente", json!({ "id_tarea": "a2" }), "submissions", Some("a2")),
        ("entrega_calificada", json!({ "id_tarea": "a3" }), "submissions", Some("a3")),
        ("calificacion_actualizada", json!({ "id_curso": "c1" }), "grades", Some("c1")),
        ("modulo_creado", json!({ "id_curso": "c1" }), "modules", Some("c1")),
        ("nueva_tarea", json!({ "id_modulo": "m1" }), "assignments", Some("m1")),
    ];

    for (i, (event, payload, resource, id)) in cases.iter().enumerate() {
        let result = request_ok(
            &mut daemon,
            &format!("rt-{}", i),
            "realtime.dispatch",
            json!({ "event": event, "payload": payload }),
        );
        assert!(
            result.get("toast").and_then(|v| v.as_str()).is_some(),
            "{} should carry a toast",
            event
        );
        let refresh = result.get("refresh").expect("refresh");
        assert_eq!(
            refresh.get("resource").and_then(|v| v.as_str()),
            Some(*resource),
            "{}",
            event
        );
        assert_eq!(refresh.get("id").and_then(|v| v.as_str()), *id, "{}", event);
    }
}

#[test]
fn unknown_events_are_acknowledged_without_refresh() {
    let prefs = temp_path("aulad-rt-unknown", ".json");
    let mut daemon = spawn_daemon(None, &prefs);

    let result = request_ok(
        &mut daemon,
        "1",
        "realtime.dispatch",
        json!({ "event": "mantenimiento", "payload": { "id_curso": "c1" } }),
    );
    assert!(result.get("toast").is_none());
    assert!(result.get("refresh").is_none());
}

#[test]
fn numeric_payload_ids_are_stringified() {
    let prefs = temp_path("aulad-rt-numeric", ".json");
    let mut daemon = spawn_daemon(None, &prefs);

    let result = request_ok(
        &mut daemon,
        "1",
        "realtime.dispatch",
        json!({ "event": "modulo_creado", "payload": { "id_curso": 7 } }),
    );
    assert_eq!(
        result
            .get("refresh")
            .and_then(|r| r.get("id"))
            .and_then(|v| v.as_str()),
        Some("7")
    );
}
