use chrono::NaiveTime;
use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::helpers::{api_client, api_failure};
use crate::ipc::types::{AppState, Request};
use crate::models::ScheduleBlock;

/// Week ordering for the Spanish day names the backend uses. Unknown
/// labels sort last rather than failing the view.
fn weekday_index(day: &str) -> u8 {
    match day.trim().to_lowercase().as_str() {
        "lunes" => 0,
        "martes" => 1,
        "miércoles" | "miercoles" => 2,
        "jueves" => 3,
        "viernes" => 4,
        "sábado" | "sabado" => 5,
        "domingo" => 6,
        _ => 7,
    }
}

// Unparseable times sort first within their day instead of failing the view.
fn start_time(block: &ScheduleBlock) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(&block.start_time, "%H:%M").ok()
}

fn block_json(b: &ScheduleBlock) -> serde_json::Value {
    json!({
        "day": b.day,
        "startTime": b.start_time,
        "endTime": b.end_time,
        "courseName": b.course_name,
        "courseCode": b.course_code,
        "room": b.room,
    })
}

fn handle_schedule_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let api = match api_client(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut blocks = match api.my_schedule() {
        Ok(v) => v,
        Err(e) => return api_failure(&req.id, e),
    };

    blocks.sort_by_key(|b| (weekday_index(&b.day), start_time(b)));

    let mut days: Vec<serde_json::Value> = Vec::new();
    for block in &blocks {
        let label = block.day.trim().to_lowercase();
        let needs_new_day = days
            .last()
            .and_then(|d| d.get("day"))
            .and_then(|v| v.as_str())
            .map(|d| d != label)
            .unwrap_or(true);
        if needs_new_day {
            days.push(json!({ "day": label, "blocks": [] }));
        }
        if let Some(arr) = days
            .last_mut()
            .and_then(|d| d.get_mut("blocks"))
            .and_then(|v| v.as_array_mut())
        {
            arr.push(block_json(block));
        }
    }

    ok(
        &req.id,
        json!({
            "days": days,
            "total": blocks.len(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schedule.get" => Some(handle_schedule_get(state, req)),
        _ => None,
    }
}
