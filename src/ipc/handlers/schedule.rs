use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::progress;
use crate::schedule::{self, DefaultLabels, ProgressMap, ScheduleError};
use serde_json::json;

fn schedule_err(id: &str, e: ScheduleError) -> serde_json::Value {
    err(id, &e.code, e.message, e.details)
}

fn handle_schedule_render(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match schedule::parse_student(req.params.get("student")) {
        Ok(v) => v,
        Err(e) => return schedule_err(&req.id, e),
    };
    let scores = match schedule::parse_scores(req.params.get("scores")) {
        Ok(v) => v,
        Err(e) => return schedule_err(&req.id, e),
    };
    let overall_score = match schedule::parse_overall_score(req.params.get("overallScore")) {
        Ok(v) => v,
        Err(e) => return schedule_err(&req.id, e),
    };
    let units = match schedule::parse_units(req.params.get("units")) {
        Ok(v) => v,
        Err(e) => return schedule_err(&req.id, e),
    };
    let viewer = match schedule::parse_viewer(req.params.get("viewer")) {
        Ok(v) => v,
        Err(e) => return schedule_err(&req.id, e),
    };

    // The progress map is either supplied inline or read from the workspace
    // store for a student key; absent both, every unit reads as not started.
    let progress_map = if let Some(raw) = req.params.get("progress") {
        match schedule::parse_progress(Some(raw)) {
            Ok(v) => v,
            Err(e) => return schedule_err(&req.id, e),
        }
    } else if let Some(student_key) = req.params.get("studentKey").and_then(|v| v.as_str()) {
        let Some(conn) = state.db.as_ref() else {
            return err(&req.id, "no_workspace", "select a workspace first", None);
        };
        match progress::unit_progress_map(conn, student_key) {
            Ok(values) => ProgressMap::from_values(values),
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        }
    } else {
        ProgressMap::new()
    };

    match schedule::render_schedule(
        student.as_ref(),
        &scores,
        overall_score,
        &units,
        &progress_map,
        &viewer,
        &DefaultLabels,
    ) {
        Ok(view) => ok(&req.id, json!({ "schedule": view })),
        Err(e) => schedule_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schedule.render" => Some(handle_schedule_render(state, req)),
        _ => None,
    }
}
