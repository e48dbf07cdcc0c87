use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::progress;
use rusqlite::Connection;
use serde_json::json;

fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn handle_set_unit_progress(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_key = match required_str(req, "studentKey") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let unit_id = match required_str(req, "unitId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(value) = req.params.get("value").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "value must be an integer", None);
    };
    if !(0..=2).contains(&value) {
        return err(
            &req.id,
            "validation_failed",
            "unit progress value must be 0, 1 or 2",
            Some(json!({ "value": value })),
        );
    }

    if let Err(e) = progress::set_unit_progress(conn, &student_key, &unit_id, value) {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(
        &req.id,
        json!({ "studentKey": student_key, "unitId": unit_id, "value": value }),
    )
}

fn handle_assessment_completed(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_key = match required_str(req, "studentKey") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let unit_id = match required_str(req, "unitId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match progress::put_assessment_completed(conn, &student_key, &unit_id) {
        Ok(value) => ok(
            &req.id,
            json!({ "studentKey": student_key, "unitId": unit_id, "value": value }),
        ),
        Err(e) => err(&req.id, "db_insert_failed", e.to_string(), None),
    }
}

fn handle_unit_progress(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_key = match required_str(req, "studentKey") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match progress::unit_progress_map(conn, &student_key) {
        Ok(values) => {
            let map: serde_json::Map<String, serde_json::Value> = values
                .into_iter()
                .map(|(unit_id, value)| (unit_id, json!(value)))
                .collect();
            ok(
                &req.id,
                json!({ "studentKey": student_key, "progress": map }),
            )
        }
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "progress.setUnitProgress" => Some(handle_set_unit_progress(state, req)),
        "progress.assessmentCompleted" => Some(handle_assessment_completed(state, req)),
        "progress.unitProgress" => Some(handle_unit_progress(state, req)),
        _ => None,
    }
}
