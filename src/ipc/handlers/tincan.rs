use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::tincan::{self, AssessmentSubmission, CourseActivity, CourseResult};
use chrono::Utc;
use serde_json::json;

fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn parse_course(req: &Request) -> Result<CourseActivity, serde_json::Value> {
    let Some(obj) = req.params.get("course").and_then(|v| v.as_object()) else {
        return Err(err(&req.id, "bad_params", "missing course", None));
    };
    let Some(uri) = obj.get("uri").and_then(|v| v.as_str()) else {
        return Err(err(&req.id, "bad_params", "missing course.uri", None));
    };
    let Some(name) = obj.get("name").and_then(|v| v.as_str()) else {
        return Err(err(&req.id, "bad_params", "missing course.name", None));
    };
    Ok(CourseActivity {
        uri: uri.to_string(),
        name: name.to_string(),
        description: obj
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
    })
}

fn optional_uri(req: &Request, key: &str) -> String {
    tincan::activity_uri_or_random(req.params.get(key).and_then(|v| v.as_str()))
}

fn handle_assessment(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_key = match required_str(req, "studentKey") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assessment_type = match required_str(req, "assessmentType") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course = match parse_course(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(score) = req.params.get("score").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "score must be a number", None);
    };

    let question_results = match req.params.get("questionResults") {
        None => Vec::new(),
        Some(v) => {
            let Some(arr) = v.as_array() else {
                return err(&req.id, "bad_params", "questionResults must be an array", None);
            };
            let mut out = Vec::with_capacity(arr.len());
            for entry in arr {
                let Some(flag) = entry.as_bool() else {
                    return err(
                        &req.id,
                        "bad_params",
                        "questionResults must contain only booleans",
                        None,
                    );
                };
                out.push(flag);
            }
            out
        }
    };

    let course_result = match req.params.get("courseResult") {
        None => None,
        Some(v) if v.is_null() => None,
        Some(v) => {
            let (Some(score_scaled), Some(success)) = (
                v.get("scoreScaled").and_then(|s| s.as_f64()),
                v.get("success").and_then(|s| s.as_bool()),
            ) else {
                return err(
                    &req.id,
                    "bad_params",
                    "courseResult requires scoreScaled and success",
                    None,
                );
            };
            Some(CourseResult {
                score_scaled,
                success,
            })
        }
    };

    let submission = AssessmentSubmission {
        student_key,
        assessment_type,
        assessment_uri: optional_uri(req, "assessmentUri"),
        score,
        question_results,
        course_result,
    };
    let statements = tincan::assessment_statements(&submission, &course, Utc::now());
    ok(&req.id, json!({ "statements": statements }))
}

fn handle_watch_video(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_key = match required_str(req, "studentKey") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let video = match required_str(req, "video") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course = match parse_course(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(duration) = req.params.get("duration").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "duration must be an integer", None);
    };
    let completion = req
        .params
        .get("completion")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let statement = tincan::watched_video_statement(
        &student_key,
        &video,
        duration,
        completion,
        &optional_uri(req, "parentUri"),
        &course,
        Utc::now(),
    );
    ok(&req.id, json!({ "statements": [statement] }))
}

fn handle_check_answer(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_key = match required_str(req, "studentKey") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let question = match required_str(req, "question") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course = match parse_course(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let success = req
        .params
        .get("success")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let skipped = req
        .params
        .get("skipped")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let statement = tincan::checked_answer_statement(
        &student_key,
        &question,
        success,
        skipped,
        &optional_uri(req, "parentUri"),
        &course,
        Utc::now(),
    );
    ok(&req.id, json!({ "statements": [statement] }))
}

fn handle_assessment_check(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_key = match required_str(req, "studentKey") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course = match parse_course(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(score_scaled) = req.params.get("scoreScaled").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "scoreScaled must be a number", None);
    };

    let statement = tincan::assessment_check_statement(
        &student_key,
        score_scaled,
        &optional_uri(req, "activityUri"),
        &course,
        Utc::now(),
    );
    ok(&req.id, json!({ "statements": [statement] }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tincan.assessment" => Some(handle_assessment(state, req)),
        "tincan.watchVideo" => Some(handle_watch_video(state, req)),
        "tincan.checkAnswer" => Some(handle_check_answer(state, req)),
        "tincan.assessmentCheck" => Some(handle_assessment_check(state, req)),
        _ => None,
    }
}
