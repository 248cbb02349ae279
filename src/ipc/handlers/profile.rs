use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_client, api_failure, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::models::{PasswordPayload, ProfilePayload, TeacherProfile};

const MIN_PASSWORD_LEN: usize = 8;

fn profile_json(p: &TeacherProfile) -> serde_json::Value {
    json!({
        "id": p.id,
        "name": p.name,
        "surname": p.surname,
        "email": p.email,
        "phone": p.phone,
    })
}

fn handle_profile_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match api.me() {
        Ok(profile) => ok(&req.id, json!({ "profile": profile_json(&profile) })),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_profile_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let email = optional_str(req, "email");
    if let Some(email) = &email {
        if !email.contains('@') {
            return err(
                &req.id,
                "bad_params",
                "email is not valid",
                Some(json!({ "email": email })),
            );
        }
    }
    let payload = ProfilePayload {
        name: optional_str(req, "name"),
        surname: optional_str(req, "surname"),
        email,
    };
    match api.update_me(&payload) {
        Ok(profile) => ok(&req.id, json!({ "profile": profile_json(&profile) })),
        Err(e) => api_failure(&req.id, e),
    }
}

fn handle_change_password(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let current = match required_str(req, "current") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let new = match required_str(req, "new") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let confirmation = match required_str(req, "confirmation") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    if new.chars().count() < MIN_PASSWORD_LEN {
        return err(
            &req.id,
            "bad_params",
            format!("password must be at least {} characters long", MIN_PASSWORD_LEN),
            None,
        );
    }
    if new != confirmation {
        return err(
            &req.id,
            "bad_params",
            "password confirmation does not match",
            None,
        );
    }

    let payload = PasswordPayload { current, new };
    match api.change_password(&payload) {
        Ok(()) => ok(&req.id, json!({ "changed": true })),
        Err(e) => api_failure(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profile.get" => Some(handle_profile_get(state, req)),
        "profile.update" => Some(handle_profile_update(state, req)),
        "profile.changePassword" => Some(handle_change_password(state, req)),
        _ => None,
    }
}
