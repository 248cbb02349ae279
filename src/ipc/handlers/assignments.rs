use chrono::NaiveDate;
use serde_json::json;

use crate::calc::{weight_budget_allows, MODULE_POINT_BUDGET};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    api_client, api_failure, optional_bool, optional_f64, optional_str, required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::models::{Assignment, AssignmentPayload, Module};

pub(super) fn assignment_json(a: &Assignment) -> serde_json::Value {
    json!({
        "id": a.id,
        "moduleId": a.module_id,
        "categoryId": a.category_id,
        "title": a.title,
        "description": a.description,
        "maxScore": a.max_score,
        "minPassingScore": a.min_passing_score,
        "weight": a.weight,
        "dueDate": a.due_date,
        "allowsFile": a.allows_file,
        "allowedFormats": a.allowed_formats,
    })
}

fn assignments_json(assignments: &[Assignment]) -> Vec<serde_json::Value> {
    assignments.iter().map(assignment_json).collect()
}

struct ValidatedFields {
    title: String,
    max_score: f64,
    weight: f64,
    min_passing_score: Option<f64>,
    due_date: Option<String>,
}

/// Entry-time validation shared by create and update. Predictable
/// rejections never reach the backend.
fn validate_fields(
    req: &Request,
    title: String,
    max_score: f64,
    weight: f64,
    min_passing_score: Option<f64>,
    due_date: Option<String>,
) -> Result<ValidatedFields, serde_json::Value> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(err(&req.id, "bad_params", "title must not be empty", None));
    }
    if !max_score.is_finite() || max_score <= 0.0 {
        return Err(err(
            &req.id,
            "bad_params",
            "maxScore must be a positive number",
            Some(json!({ "maxScore": max_score })),
        ));
    }
    if !weight.is_finite() || weight < 0.0 {
        return Err(err(
            &req.id,
            "bad_params",
            "weight must be zero or positive",
            Some(json!({ "weight": weight })),
        ));
    }
    if let Some(mps) = min_passing_score {
        if !mps.is_finite() || mps < 0.0 || mps > max_score {
            return Err(err(
                &req.id,
                "bad_params",
                "minPassingScore must be between 0 and maxScore",
                Some(json!({ "minPassingScore": mps, "maxScore": max_score })),
            ));
        }
    }
    if let Some(raw) = &due_date {
        if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err() {
            return Err(err(
                &req.id,
                "bad_params",
                "dueDate must be a YYYY-MM-DD date",
                Some(json!({ "dueDate": raw })),
            ));
        }
    }
    Ok(ValidatedFields {
        title,
        max_score,
        weight,
        min_passing_score,
        due_date,
    })
}

/// Category/budget rules from the module invariants: with categories every
/// assignment must name exactly one of them (their weights are not summed
/// into the module); without categories the direct weight sum is gated by
/// the module budget.
fn check_category_and_budget(
    req: &Request,
    module: &Module,
    category_id: &Option<String>,
    weight: f64,
    siblings: &[Assignment],
    exclude_id: Option<&str>,
) -> Result<(), serde_json::Value> {
    if !module.categories.is_empty() {
        let Some(category_id) = category_id else {
            return Err(err(
                &req.id,
                "bad_params",
                "module uses categories; categoryId is required",
                None,
            ));
        };
        if !module.categories.iter().any(|c| &c.id == category_id) {
            return Err(err(
                &req.id,
                "bad_params",
                "categoryId does not belong to the module",
                Some(json!({ "categoryId": category_id })),
            ));
        }
        return Ok(());
    }

    if category_id.is_some() {
        return Err(err(
            &req.id,
            "bad_params",
            "module has no categories",
            None,
        ));
    }
    let existing_sum: f64 = siblings
        .iter()
        .filter(|a| Some(a.id.as_str()) != exclude_id)
        .map(|a| a.weight)
        .sum();
    if !weight_budget_allows(existing_sum, weight, MODULE_POINT_BUDGET) {
        return Err(err(
            &req.id,
            "bad_params",
            "assignment weights would exceed the module budget",
            Some(json!({
                "existingSum": existing_sum,
                "proposed": weight,
                "budget": MODULE_POINT_BUDGET,
            })),
        ));
    }
    Ok(())
}

fn allowed_formats(req: &Request) -> Vec<String> {
    req.params
        .get("allowedFormats")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_ascii_lowercase())
                .collect()
        })
        .unwrap_or_default()
}

fn handle_list_by_module(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let module_id = match required_str(req, "moduleId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match api.assignments_by_module(&module_id) {
        Ok(assignments) => ok(
            &req.id,
            json!({ "assignments": assignments_json(&assignments) }),
        ),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assignment_id = match required_str(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match api.assignment(&assignment_id) {
        Ok(assignment) => ok(&req.id, json!({ "assignment": assignment_json(&assignment) })),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let module_id = match required_str(req, "moduleId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let title = match required_str(req, "title") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(max_score) = optional_f64(req, "maxScore") else {
        return err(&req.id, "bad_params", "missing maxScore", None);
    };
    let Some(weight) = optional_f64(req, "weight") else {
        return err(&req.id, "bad_params", "missing weight", None);
    };
    let fields = match validate_fields(
        req,
        title,
        max_score,
        weight,
        optional_f64(req, "minPassingScore"),
        optional_str(req, "dueDate"),
    ) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let category_id = optional_str(req, "categoryId");

    let module = match api.module(&module_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    let siblings = match api.assignments_by_module(&module_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    if let Err(resp) =
        check_category_and_budget(req, &module, &category_id, fields.weight, &siblings, None)
    {
        return resp;
    }

    let payload = AssignmentPayload {
        module_id: module_id.clone(),
        category_id,
        title: fields.title,
        description: optional_str(req, "description"),
        max_score: fields.max_score,
        min_passing_score: fields.min_passing_score,
        weight: fields.weight,
        due_date: fields.due_date,
        allows_file: optional_bool(req, "allowsFile").unwrap_or(false),
        allowed_formats: allowed_formats(req),
    };
    let created = match api.create_assignment(&payload) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    match api.assignments_by_module(&module_id) {
        Ok(assignments) => ok(
            &req.id,
            json!({
                "assignment": assignment_json(&created),
                "assignments": assignments_json(&assignments),
            }),
        ),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assignment_id = match required_str(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let existing = match api.assignment(&assignment_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };

    let fields = match validate_fields(
        req,
        optional_str(req, "title").unwrap_or_else(|| existing.title.clone()),
        optional_f64(req, "maxScore").unwrap_or(existing.max_score),
        optional_f64(req, "weight").unwrap_or(existing.weight),
        optional_f64(req, "minPassingScore").or(existing.min_passing_score),
        optional_str(req, "dueDate").or_else(|| existing.due_date.clone()),
    ) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let category_id = optional_str(req, "categoryId").or_else(|| existing.category_id.clone());

    let module = match api.module(&existing.module_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    let siblings = match api.assignments_by_module(&existing.module_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    if let Err(resp) = check_category_and_budget(
        req,
        &module,
        &category_id,
        fields.weight,
        &siblings,
        Some(assignment_id.as_str()),
    ) {
        return resp;
    }

    let payload = AssignmentPayload {
        module_id: existing.module_id.clone(),
        category_id,
        title: fields.title,
        description: optional_str(req, "description").or_else(|| existing.description.clone()),
        max_score: fields.max_score,
        min_passing_score: fields.min_passing_score,
        weight: fields.weight,
        due_date: fields.due_date,
        allows_file: optional_bool(req, "allowsFile").unwrap_or(existing.allows_file),
        allowed_formats: if req.params.get("allowedFormats").is_some() {
            allowed_formats(req)
        } else {
            existing.allowed_formats.clone()
        },
    };
    let updated = match api.update_assignment(&assignment_id, &payload) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    match api.assignments_by_module(&existing.module_id) {
        Ok(assignments) => ok(
            &req.id,
            json!({
                "assignment": assignment_json(&updated),
                "assignments": assignments_json(&assignments),
            }),
        ),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assignment_id = match required_str(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let existing = match api.assignment(&assignment_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    if let Err(e) = api.delete_assignment(&assignment_id) {
        return api_failure(&req.id, e);
    }
    match api.assignments_by_module(&existing.module_id) {
        Ok(assignments) => ok(
            &req.id,
            json!({ "assignments": assignments_json(&assignments) }),
        ),
        Err(e) => api_failure(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.listByModule" => Some(handle_list_by_module(state, req)),
        "assignments.get" => Some(handle_get(state, req)),
        "assignments.create" => Some(handle_create(state, req)),
        "assignments.update" => Some(handle_update(state, req)),
        "assignments.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
