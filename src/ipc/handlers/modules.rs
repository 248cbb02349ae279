use chrono::NaiveDate;
use serde_json::json;

use crate::calc::{weight_budget_allows, MODULE_POINT_BUDGET};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_client, api_failure, optional_str, required_f64, required_str};
use crate::ipc::types::{AppState, Request};
use crate::models::{CategoryPayload, Module, ModulePayload};

pub(super) fn module_json(m: &Module) -> serde_json::Value {
    let category_weight_sum: f64 = m.categories.iter().map(|c| c.weight).sum();
    json!({
        "id": m.id,
        "courseId": m.course_id,
        "name": m.name,
        "startDate": m.start_date,
        "endDate": m.end_date,
        "state": m.state,
        "averagesPublished": m.averages_published,
        "categories": m.categories.iter().map(|c| json!({
            "id": c.id,
            "name": c.name,
            "weight": c.weight,
        })).collect::<Vec<_>>(),
        "categoryWeightSum": category_weight_sum,
    })
}

fn modules_json(modules: &[Module]) -> Vec<serde_json::Value> {
    modules.iter().map(module_json).collect()
}

fn parse_date(req: &Request, key: &str) -> Result<Option<String>, serde_json::Value> {
    let Some(raw) = optional_str(req, key) else {
        return Ok(None);
    };
    match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(_) => Ok(Some(raw)),
        Err(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a YYYY-MM-DD date", key),
            Some(json!({ key: raw })),
        )),
    }
}

fn check_date_range(
    req: &Request,
    start: &Option<String>,
    end: &Option<String>,
) -> Result<(), serde_json::Value> {
    if let (Some(s), Some(e)) = (start, end) {
        let s = NaiveDate::parse_from_str(s, "%Y-%m-%d");
        let e = NaiveDate::parse_from_str(e, "%Y-%m-%d");
        if let (Ok(s), Ok(e)) = (s, e) {
            if s > e {
                return Err(err(
                    &req.id,
                    "bad_params",
                    "startDate must not be after endDate",
                    None,
                ));
            }
        }
    }
    Ok(())
}

/// Duplicate-name pre-check: predictable rejections are caught before the
/// round-trip.
fn duplicate_name(modules: &[Module], name: &str, exclude_id: Option<&str>) -> bool {
    let needle = name.trim().to_lowercase();
    modules.iter().any(|m| {
        Some(m.id.as_str()) != exclude_id && m.name.trim().to_lowercase() == needle
    })
}

fn handle_modules_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_id = match required_str(req, "courseId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match api.modules_by_course(&course_id) {
        Ok(modules) => ok(&req.id, json!({ "modules": modules_json(&modules) })),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_modules_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let module_id = match required_str(req, "moduleId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match api.module(&module_id) {
        Ok(module) => ok(&req.id, json!({ "module": module_json(&module) })),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_modules_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_id = match required_str(req, "courseId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }
    let start_date = match parse_date(req, "startDate") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let end_date = match parse_date(req, "endDate") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_date_range(req, &start_date, &end_date) {
        return resp;
    }

    let siblings = match api.modules_by_course(&course_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    if duplicate_name(&siblings, &name, None) {
        return err(
            &req.id,
            "bad_params",
            "a module with that name already exists",
            Some(json!({ "name": name })),
        );
    }

    let payload = ModulePayload {
        course_id: course_id.clone(),
        name,
        start_date,
        end_date,
    };
    let created = match api.create_module(&payload) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    // Refresh-on-write: return the authoritative list, never a local patch.
    match api.modules_by_course(&course_id) {
        Ok(modules) => ok(
            &req.id,
            json!({
                "module": module_json(&created),
                "modules": modules_json(&modules),
            }),
        ),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_modules_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let module_id = match required_str(req, "moduleId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let existing = match api.module(&module_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };

    let name = match optional_str(req, "name") {
        Some(v) => {
            let v = v.trim().to_string();
            if v.is_empty() {
                return err(&req.id, "bad_params", "name must not be empty", None);
            }
            v
        }
        None => existing.name.clone(),
    };
    let start_date = match parse_date(req, "startDate") {
        Ok(v) => v.or_else(|| existing.start_date.clone()),
        Err(resp) => return resp,
    };
    let end_date = match parse_date(req, "endDate") {
        Ok(v) => v.or_else(|| existing.end_date.clone()),
        Err(resp) => return resp,
    };
    if let Err(resp) = check_date_range(req, &start_date, &end_date) {
        return resp;
    }

    let siblings = match api.modules_by_course(&existing.course_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    if duplicate_name(&siblings, &name, Some(module_id.as_str())) {
        return err(
            &req.id,
            "bad_params",
            "a module with that name already exists",
            Some(json!({ "name": name })),
        );
    }

    let payload = ModulePayload {
        course_id: existing.course_id.clone(),
        name,
        start_date,
        end_date,
    };
    let updated = match api.update_module(&module_id, &payload) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    match api.modules_by_course(&existing.course_id) {
        Ok(modules) => ok(
            &req.id,
            json!({
                "module": module_json(&updated),
                "modules": modules_json(&modules),
            }),
        ),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_modules_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let module_id = match required_str(req, "moduleId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let existing = match api.module(&module_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    // Deleting a module with dependent data is the server's call; its
    // rejection detail is surfaced as-is.
    if let Err(e) = api.delete_module(&module_id) {
        return api_failure(&req.id, e);
    }
    match api.modules_by_course(&existing.course_id) {
        Ok(modules) => ok(&req.id, json!({ "modules": modules_json(&modules) })),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_modules_lifecycle(
    state: &mut AppState,
    req: &Request,
    action: &str,
) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let module_id = match required_str(req, "moduleId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match api.module_lifecycle(&module_id, action) {
        Ok(module) => ok(&req.id, json!({ "module": module_json(&module) })),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_categories_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let module_id = match required_str(req, "moduleId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }
    let weight = match required_f64(req, "weight") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if !weight.is_finite() || weight <= 0.0 {
        return err(
            &req.id,
            "bad_params",
            "weight must be a positive number",
            Some(json!({ "weight": weight })),
        );
    }

    let module = match api.module(&module_id) {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };
    let existing_sum: f64 = module.categories.iter().map(|c| c.weight).sum();
    if !weight_budget_allows(existing_sum, weight, MODULE_POINT_BUDGET) {
        return err(
            &req.id,
            "bad_params",
            "category weights would exceed the module budget",
            Some(json!({
                "existingSum": existing_sum,
                "proposed": weight,
                "budget": MODULE_POINT_BUDGET,
            })),
        );
    }

    let payload = CategoryPayload { name, weight };
    match api.create_category(&module_id, &payload) {
        Ok(module) => ok(&req.id, json!({ "module": module_json(&module) })),
        Err(e) => api_failure(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "modules.list" => Some(handle_modules_list(state, req)),
        "modules.get" => Some(handle_modules_get(state, req)),
        "modules.create" => Some(handle_modules_create(state, req)),
        "modules.update" => Some(handle_modules_update(state, req)),
        "modules.delete" => Some(handle_modules_delete(state, req)),
        "modules.close" => Some(handle_modules_lifecycle(state, req, "cerrar")),
        "modules.reopen" => Some(handle_modules_lifecycle(state, req, "reabrir")),
        "modules.publishAverages" => {
            Some(handle_modules_lifecycle(state, req, "publicar-promedios"))
        }
        "modules.hideAverages" => Some(handle_modules_lifecycle(state, req, "ocultar-promedios")),
        "categories.create" => Some(handle_categories_create(state, req)),
        _ => None,
    }
}
