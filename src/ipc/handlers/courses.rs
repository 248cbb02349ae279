use serde_json::json;

use crate::calc::{sort_students, RosterFilter};
use crate::ipc::error::ok;
use crate::ipc::helpers::{api_client, api_failure, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::models::{Course, Student};

pub(super) fn course_json(c: &Course) -> serde_json::Value {
    json!({
        "id": c.id,
        "name": c.name,
        "code": c.code,
        "studentCount": c.student_count,
    })
}

pub(super) fn student_json(s: &Student) -> serde_json::Value {
    json!({
        "id": s.id,
        "name": s.name,
        "surname": s.surname,
        "nationalId": s.national_id,
        "courseName": s.course_name,
        "courseCode": s.course_code,
        "enrollmentState": s.enrollment_state,
    })
}

fn handle_courses_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match api.my_courses() {
        Ok(courses) => ok(
            &req.id,
            json!({ "courses": courses.iter().map(course_json).collect::<Vec<_>>() }),
        ),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_courses_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_id = match required_str(req, "courseId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match api.course(&course_id) {
        Ok(course) => ok(&req.id, json!({ "course": course_json(&course) })),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_courses_roster(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_id = match required_str(req, "courseId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match api.course_roster(&course_id) {
        Ok(mut students) => {
            sort_students(&mut students);
            ok(
                &req.id,
                json!({
                    "students": students.iter().map(student_json).collect::<Vec<_>>(),
                    "total": students.len(),
                }),
            )
        }
        Err(e) => api_failure(&req.id, e),
    }
}

/// Teacher-wide roster with the three composing predicates. The fetched
/// snapshot is narrowed, never mutated; ordering is re-applied after the
/// filter.
fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let filter = RosterFilter {
        search: optional_str(req, "search"),
        course: optional_str(req, "course"),
        status: optional_str(req, "status"),
    }
    .normalized();

    match api.my_students() {
        Ok(students) => {
            let mut visible = filter.apply(&students);
            sort_students(&mut visible);
            ok(
                &req.id,
                json!({
                    "students": visible.iter().map(student_json).collect::<Vec<_>>(),
                    "total": visible.len(),
                }),
            )
        }
        Err(e) => api_failure(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_courses_list(state, req)),
        "courses.get" => Some(handle_courses_get(state, req)),
        "courses.roster" => Some(handle_courses_roster(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        _ => None,
    }
}
