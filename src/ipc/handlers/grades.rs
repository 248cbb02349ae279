use serde_json::json;

use crate::calc;
use crate::calc::RosterFilter;
use crate::ipc::error::ok;
use crate::ipc::helpers::{api_client, api_failure, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::models::Module;

/// Column order for the gradebook table: the course's module list first,
/// then any module only present in the snapshot.
pub(super) fn module_columns(
    modules: &[Module],
    snapshot: &crate::models::GradeSnapshot,
) -> Vec<String> {
    let mut order: Vec<String> = modules.iter().map(|m| m.id.clone()).collect();
    for id in calc::module_order_from(&snapshot.assignments, &snapshot.module_averages) {
        if !order.contains(&id) {
            order.push(id);
        }
    }
    order
}

fn handle_grades_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_id = match required_str(req, "courseId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let filter = RosterFilter {
        search: optional_str(req, "search"),
        course: None,
        status: None,
    }
    .normalized();

    let snapshot = match api.grade_snapshot(&course_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    let modules = match api.modules_by_course(&course_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };

    let order = module_columns(&modules, &snapshot);
    let scores = calc::score_map(&snapshot.scores);
    let averages = calc::module_average_map(&snapshot.module_averages);
    let visible = filter.apply(&snapshot.students);
    let rows = calc::aggregate_rows(&visible, &snapshot.assignments, &scores, &averages, &order);
    // Stats always cover exactly the filtered rows; they are recomputed on
    // every search change, not cached.
    let stats = calc::course_stats(&rows);

    let columns: Vec<serde_json::Value> = order
        .iter()
        .map(|id| {
            let name = modules
                .iter()
                .find(|m| &m.id == id)
                .map(|m| m.name.clone());
            json!({ "moduleId": id, "name": name })
        })
        .collect();

    ok(
        &req.id,
        json!({
            "columns": columns,
            "rows": rows,
            "stats": stats,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.overview" => Some(handle_grades_overview(state, req)),
        _ => None,
    }
}
