use std::path::PathBuf;

use serde_json::json;
use tracing::info;

use crate::calc;
use crate::export;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_client, api_failure, required_str};
use crate::ipc::types::{AppState, Request};

struct GradebookData {
    course: crate::models::Course,
    modules: Vec<crate::models::Module>,
    snapshot: crate::models::GradeSnapshot,
    rows: Vec<calc::StudentGradeRow>,
    scores: std::collections::HashMap<(String, String), f64>,
}

/// Exports always cover the full roster; the shell applies no filter here.
fn fetch_gradebook(
    api: &crate::api::ApiClient,
    course_id: &str,
) -> Result<GradebookData, crate::api::ApiError> {
    let course = api.course(course_id)?;
    let snapshot = api.grade_snapshot(course_id)?;
    let modules = api.modules_by_course(course_id)?;

    let order = super::grades::module_columns(&modules, &snapshot);
    let scores = calc::score_map(&snapshot.scores);
    let averages = calc::module_average_map(&snapshot.module_averages);
    let rows = calc::aggregate_rows(
        &snapshot.students,
        &snapshot.assignments,
        &scores,
        &averages,
        &order,
    );
    Ok(GradebookData {
        course,
        modules,
        snapshot,
        rows,
        scores,
    })
}

fn handle_gradebook_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_id = match required_str(req, "courseId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let data = match fetch_gradebook(api, &course_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    let sheets = export::gradebook_sheets(
        &data.course,
        &data.modules,
        &data.snapshot.assignments,
        &data.scores,
        &data.rows,
    );
    ok(
        &req.id,
        json!({
            "course": super::courses::course_json(&data.course),
            "sheets": sheets,
        }),
    )
}

fn handle_write_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_id = match required_str(req, "courseId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let out_path = match required_str(req, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    let data = match fetch_gradebook(api, &course_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    let sheets = export::gradebook_sheets(
        &data.course,
        &data.modules,
        &data.snapshot.assignments,
        &data.scores,
        &data.rows,
    );
    match export::write_bundle(&out_path, &data.course.name, &sheets) {
        Ok(summary) => {
            info!(path = %out_path.display(), entries = summary.entry_count, "gradebook bundle written");
            ok(
                &req.id,
                json!({
                    "path": out_path.to_string_lossy(),
                    "entryCount": summary.entry_count,
                    "entries": summary.entries,
                }),
            )
        }
        Err(e) => err(&req.id, "io_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exports.gradebookModel" => Some(handle_gradebook_model(state, req)),
        "exports.writeBundle" => Some(handle_write_bundle(state, req)),
        _ => None,
    }
}
