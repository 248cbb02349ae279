use serde_json::json;

use crate::calc::{clamp_display, traffic_light};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_client, api_failure, optional_str, required_f64, required_str};
use crate::ipc::types::{AppState, Request};
use crate::models::{Assignment, GradePayload, Submission};

/// Stored scores are clamped defensively for display; the grade-entry path
/// below rejects out-of-range input instead of clamping it.
fn submission_json(s: &Submission, assignment: &Assignment) -> serde_json::Value {
    let display_score = s.score.map(|v| clamp_display(v, assignment.max_score));
    json!({
        "id": s.id,
        "assignmentId": s.assignment_id,
        "studentId": s.student_id,
        "studentName": s.student_name,
        "submittedAt": s.submitted_at,
        "fileUrl": s.file_url,
        "score": display_score,
        "comment": s.comment,
        "state": s.state(),
        "trafficLight": display_score.map(|v| traffic_light(v, assignment.max_score)),
    })
}

fn submissions_json(submissions: &[Submission], assignment: &Assignment) -> serde_json::Value {
    json!({
        "assignment": super::assignments::assignment_json(assignment),
        "submissions": submissions
            .iter()
            .map(|s| submission_json(s, assignment))
            .collect::<Vec<_>>(),
        "pending": submissions.iter().filter(|s| s.score.is_none()).count(),
        "graded": submissions.iter().filter(|s| s.score.is_some()).count(),
    })
}

fn handle_list_by_assignment(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assignment_id = match required_str(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assignment = match api.assignment(&assignment_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    match api.submissions_by_assignment(&assignment_id) {
        Ok(submissions) => ok(&req.id, submissions_json(&submissions, &assignment)),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_grade(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let submission_id = match required_str(req, "submissionId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assignment_id = match required_str(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let score = match required_f64(req, "score") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let assignment = match api.assignment(&assignment_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    // The user typed this grade: reject, never clamp. The form stays open
    // with its input intact on the shell side.
    if !score.is_finite() || score < 0.0 || score > assignment.max_score {
        return err(
            &req.id,
            "bad_params",
            format!(
                "grade must be between 0 and {}",
                assignment.max_score
            ),
            Some(json!({ "score": score, "maxScore": assignment.max_score })),
        );
    }

    let payload = GradePayload {
        score,
        comment: optional_str(req, "comment"),
    };
    if let Err(e) = api.grade_submission(&submission_id, &payload) {
        return api_failure(&req.id, e);
    }
    // Refresh-on-write: hand back the authoritative list.
    match api.submissions_by_assignment(&assignment_id) {
        Ok(submissions) => ok(&req.id, submissions_json(&submissions, &assignment)),
        Err(e) => api_failure(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "submissions.listByAssignment" => Some(handle_list_by_assignment(state, req)),
        "submissions.grade" => Some(handle_grade(state, req)),
        _ => None,
    }
}
