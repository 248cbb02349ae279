mod common;

use common::{request_err, request_ok, spawn_daemon, temp_path, StubServer};
use serde_json::json;

fn seed_assignment(server: &StubServer) {
    server.route(
        "GET",
        "/api/tareas/a1",
        json!({
            "id": "a1", "id_modulo": "m1", "titulo": "Taller 1",
            "puntaje_maximo": 10.0, "ponderacion": 5.0
        }),
    );
    server.route(
        "GET",
        "/api/entregas/tarea/a1",
        json!([
            {
                "id": "e1", "id_tarea": "a1", "id_estudiante": "s1",
                "estudiante": "Soto, Ana", "fecha_envio": "2026-05-02T10:00:00Z",
                "archivo_url": "uploads/e1.pdf", "nota": 12.0, "comentario": "bien"
            },
            {
                "id": "e2", "id_tarea": "a1", "id_estudiante": "s2",
                "estudiante": "Vera, Luis", "fecha_envio": "2026-05-02T11:00:00Z"
            }
        ]),
    );
}

#[test]
fn submission_list_derives_state_and_clamps_stored_scores() {
    let server = StubServer::start();
    seed_assignment(&server);
    let prefs = temp_path("aulad-subs-list", ".json");
    let mut daemon = spawn_daemon(Some(server.base_url()), &prefs);

    let result = request_ok(
        &mut daemon,
        "1",
        "submissions.listByAssignment",
        json!({ "assignmentId": "a1" }),
    );
    assert_eq!(result.get("pending").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(result.get("graded").and_then(|v| v.as_u64()), Some(1));

    let submissions = result
        .get("submissions")
        .and_then(|v| v.as_array())
        .expect("submissions");

    let graded = &submissions[0];
    assert_eq!(graded.get("state").and_then(|v| v.as_str()), Some("graded"));
    // Stored 12.0 over a max of 10 is clamped when redisplayed.
    assert_eq!(graded.get("score").and_then(|v| v.as_f64()), Some(10.0));
    assert_eq!(
        graded.get("trafficLight").and_then(|v| v.as_str()),
        Some("green")
    );

    let pending = &submissions[1];
    assert_eq!(pending.get("state").and_then(|v| v.as_str()), Some("pending"));
    assert!(pending.get("score").expect("score key").is_null());
    assert!(pending.get("trafficLight").expect("light key").is_null());
}

#[test]
fn out_of_range_grade_is_rejected_with_a_message_and_no_request() {
    let server = StubServer::start();
    seed_assignment(&server);
    let prefs = temp_path("aulad-grade-range", ".json");
    let mut daemon = spawn_daemon(Some(server.base_url()), &prefs);

    let error = request_err(
        &mut daemon,
        "1",
        "submissions.grade",
        json!({ "submissionId": "e2", "assignmentId": "a1", "score": 11.0 }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("bad_params"));
    assert!(error
        .get("message")
        .and_then(|v| v.as_str())
        .expect("message")
        .contains("between 0 and 10"));
    assert!(server
        .requests_for("POST", "/api/entregas/e2/calificar")
        .is_empty());

    let error = request_err(
        &mut daemon,
        "2",
        "submissions.grade",
        json!({ "submissionId": "e2", "assignmentId": "a1", "score": -0.5 }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("bad_params"));
}

#[test]
fn valid_grade_posts_then_refetches_the_list() {
    let server = StubServer::start();
    seed_assignment(&server);
    server.route("POST", "/api/entregas/e2/calificar", json!({}));
    let prefs = temp_path("aulad-grade-ok", ".json");
    let mut daemon = spawn_daemon(Some(server.base_url()), &prefs);

    let result = request_ok(
        &mut daemon,
        "1",
        "submissions.grade",
        json!({
            "submissionId": "e2", "assignmentId": "a1",
            "score": 8.5, "comment": "buen trabajo"
        }),
    );
    // Refresh-on-write: the reply carries the authoritative list again.
    assert!(result.get("submissions").is_some());

    let posted = server.requests_for("POST", "/api/entregas/e2/calificar");
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].bearer.as_deref(), Some("test-token"));
    let body = posted[0].body.as_ref().expect("grade body");
    assert_eq!(body.get("nota").and_then(|v| v.as_f64()), Some(8.5));
    assert_eq!(
        body.get("comentario").and_then(|v| v.as_str()),
        Some("buen trabajo")
    );

    // The submission list was fetched again after the mutation.
    assert_eq!(server.requests_for("GET", "/api/entregas/tarea/a1").len(), 1);
}

#[test]
fn boundary_grade_at_max_is_accepted() {
    let server = StubServer::start();
    seed_assignment(&server);
    server.route("POST", "/api/entregas/e2/calificar", json!({}));
    let prefs = temp_path("aulad-grade-max", ".json");
    let mut daemon = spawn_daemon(Some(server.base_url()), &prefs);

    request_ok(
        &mut daemon,
        "1",
        "submissions.grade",
        json!({ "submissionId": "e2", "assignmentId": "a1", "score": 10.0 }),
    );
    assert_eq!(
        server.requests_for("POST", "/api/entregas/e2/calificar").len(),
        1
    );
}
