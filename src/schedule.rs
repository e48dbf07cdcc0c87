use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};

use crate::course::{UnitDescriptor, UnitType};

pub const UNRECOGNIZED_UNIT_LABEL: &str = "Error: unit type not recognized.";

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ScheduleError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: &str, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: Some(details),
        }
    }

    fn validation(message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::with_details("validation_failed", message, details)
    }
}

#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub key_name: String,
    pub name: String,
    pub is_enrolled: bool,
    pub enrolled_on: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScoreEntry {
    pub title: String,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerRole {
    CourseAdmin,
    Regular,
}

impl ViewerRole {
    pub fn is_admin(self) -> bool {
        self == ViewerRole::CourseAdmin
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ViewerContext {
    pub role: ViewerRole,
    pub tracking_enabled: bool,
}

/// Per-student progress values keyed by unit id. A missing entry reads as
/// zero (not started); callers never need to pre-seed units.
#[derive(Debug, Clone, Default)]
pub struct ProgressMap {
    values: HashMap<String, i64>,
}

impl ProgressMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: HashMap<String, i64>) -> Self {
        Self { values }
    }

    pub fn set(&mut self, unit_id: impl Into<String>, value: i64) {
        self.values.insert(unit_id.into(), value);
    }

    pub fn get(&self, unit_id: &str) -> i64 {
        self.values.get(unit_id).copied().unwrap_or(0)
    }
}

/// Label construction is a collaborator of the renderer, not part of it;
/// localized deployments substitute their own implementation.
pub trait LabelFormat {
    fn unit_label(&self, index: i64, title: &str) -> String;
}

pub struct DefaultLabels;

impl LabelFormat for DefaultLabels {
    fn unit_label(&self, index: i64, title: &str) -> String {
        format!("Unit {} - {}", index, title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Badge {
    Completed,
    InProgress,
    NotStarted,
    Empty,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub unit_id: String,
    pub label: String,
    pub badge: Badge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRow {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub show_bar: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentSummary {
    pub key_name: String,
    pub name: String,
    pub is_enrolled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled_on: Option<String>,
    pub scores: Vec<ScoreRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<EnrollmentSummary>,
    pub rows: Vec<ScheduleRow>,
}

/// Renders the schedule display model. Fails up front on malformed input
/// (scores outside [0,100], progress values outside their type's domain,
/// duplicate unit ids) rather than producing a partially wrong page; an
/// unrecognized unit type is not an error and degrades in its own row.
pub fn render_schedule(
    student: Option<&StudentRecord>,
    scores: &[ScoreEntry],
    overall_score: Option<f64>,
    units: &[UnitDescriptor],
    progress: &ProgressMap,
    viewer: &ViewerContext,
    labels: &dyn LabelFormat,
) -> Result<ScheduleView, ScheduleError> {
    validate_inputs(scores, overall_score, units, progress)?;

    // Visibility is decided first, per-type badge/label/link second, so the
    // two concerns cannot drift apart across unit types.
    let rows = units
        .iter()
        .map(|unit| {
            let visible = unit.now_available || viewer.role.is_admin();
            if visible {
                visible_row(unit, progress, viewer, labels)
            } else {
                hidden_row(unit)
            }
        })
        .collect();

    Ok(ScheduleView {
        student: student.map(|s| enrollment_summary(s, scores, overall_score)),
        rows,
    })
}

fn validate_inputs(
    scores: &[ScoreEntry],
    overall_score: Option<f64>,
    units: &[UnitDescriptor],
    progress: &ProgressMap,
) -> Result<(), ScheduleError> {
    for entry in scores {
        if let Some(v) = entry.score {
            if !(0.0..=100.0).contains(&v) {
                return Err(ScheduleError::validation(
                    format!("score for \"{}\" outside [0,100]", entry.title),
                    json!({ "title": entry.title, "score": v }),
                ));
            }
        }
    }
    if let Some(v) = overall_score {
        if !(0.0..=100.0).contains(&v) {
            return Err(ScheduleError::validation(
                "overall score outside [0,100]",
                json!({ "overallScore": v }),
            ));
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for unit in units {
        if !seen.insert(unit.id.as_str()) {
            return Err(ScheduleError::validation(
                format!("duplicate unit id {}", unit.id),
                json!({ "unitId": unit.id }),
            ));
        }
    }

    // Progress entries keyed by ids that match no unit are ignored; a stale
    // store row must not take the whole page down.
    for unit in units {
        let value = progress.get(&unit.id);
        let in_domain = match unit.unit_type {
            UnitType::UnitOfLessons => (0..=2).contains(&value),
            UnitType::Assessment => value >= 0,
            UnitType::Link | UnitType::Unrecognized(_) => true,
        };
        if !in_domain {
            return Err(ScheduleError::validation(
                format!("progress value {} outside domain for unit {}", value, unit.id),
                json!({ "unitId": unit.id, "value": value, "unitType": unit.unit_type.as_tag() }),
            ));
        }
    }

    Ok(())
}

// Rows a regular learner is not meant to open yet: no badge, no link, and
// for lesson units the release date stands in for the link.
fn hidden_row(unit: &UnitDescriptor) -> ScheduleRow {
    let release_date = match unit.unit_type {
        UnitType::UnitOfLessons => unit.release_date.clone(),
        _ => None,
    };
    ScheduleRow {
        unit_id: unit.id.clone(),
        label: plain_title(unit),
        badge: Badge::Empty,
        link: None,
        private: false,
        release_date,
    }
}

fn visible_row(
    unit: &UnitDescriptor,
    progress: &ProgressMap,
    viewer: &ViewerContext,
    labels: &dyn LabelFormat,
) -> ScheduleRow {
    let private = viewer.role.is_admin() && !unit.now_available;
    let (badge, label, link) = match &unit.unit_type {
        UnitType::Assessment => {
            // Assessment completion does not depend on the course-level
            // tracking flag.
            let badge = if progress.get(&unit.id) > 0 {
                Badge::Completed
            } else {
                Badge::NotStarted
            };
            (
                badge,
                unit.title.clone(),
                Some(format!("assessment?name={}", unit.id)),
            )
        }
        UnitType::UnitOfLessons => {
            let badge = if !viewer.tracking_enabled {
                Badge::Empty
            } else {
                match progress.get(&unit.id) {
                    2 => Badge::Completed,
                    1 => Badge::InProgress,
                    _ => Badge::NotStarted,
                }
            };
            (
                badge,
                labels.unit_label(unit.index, &unit.title),
                Some(format!("unit?unit={}", unit.id)),
            )
        }
        UnitType::Link => (Badge::Empty, unit.title.clone(), unit.href.clone()),
        UnitType::Unrecognized(_) => (Badge::Empty, UNRECOGNIZED_UNIT_LABEL.to_string(), None),
    };
    ScheduleRow {
        unit_id: unit.id.clone(),
        label,
        badge,
        link,
        private,
        release_date: None,
    }
}

fn plain_title(unit: &UnitDescriptor) -> String {
    match unit.unit_type {
        UnitType::Unrecognized(_) => UNRECOGNIZED_UNIT_LABEL.to_string(),
        _ => unit.title.clone(),
    }
}

fn enrollment_summary(
    student: &StudentRecord,
    scores: &[ScoreEntry],
    overall_score: Option<f64>,
) -> EnrollmentSummary {
    let score_rows = scores
        .iter()
        .map(|entry| ScoreRow {
            title: entry.title.clone(),
            score: entry.score,
            // The bar is only drawn when a score was actually recorded.
            show_bar: entry.score.is_some(),
        })
        .collect();
    EnrollmentSummary {
        key_name: student.key_name.clone(),
        name: student.name.clone(),
        is_enrolled: student.is_enrolled,
        enrolled_on: student.enrolled_on.clone(),
        scores: score_rows,
        overall_score,
    }
}

// --- params parsing -------------------------------------------------------

pub fn parse_student(raw: Option<&serde_json::Value>) -> Result<Option<StudentRecord>, ScheduleError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }
    let Some(obj) = raw.as_object() else {
        return Err(ScheduleError::new("bad_params", "student must be an object"));
    };
    let key_name = match obj.get("keyName").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return Err(ScheduleError::new("bad_params", "student.keyName must be a string")),
    };
    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let is_enrolled = obj
        .get("isEnrolled")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let enrolled_on = obj
        .get("enrolledOn")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    Ok(Some(StudentRecord {
        key_name,
        name,
        is_enrolled,
        enrolled_on,
    }))
}

pub fn parse_scores(raw: Option<&serde_json::Value>) -> Result<Vec<ScoreEntry>, ScheduleError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let Some(arr) = raw.as_array() else {
        return Err(ScheduleError::new("bad_params", "scores must be an array"));
    };
    let mut out = Vec::with_capacity(arr.len());
    for (i, v) in arr.iter().enumerate() {
        let Some(obj) = v.as_object() else {
            return Err(ScheduleError::with_details(
                "bad_params",
                "scores entries must be objects",
                json!({ "index": i }),
            ));
        };
        let title = match obj.get("title").and_then(|v| v.as_str()) {
            Some(v) => v.to_string(),
            None => {
                return Err(ScheduleError::with_details(
                    "bad_params",
                    "scores entries must carry a title",
                    json!({ "index": i }),
                ))
            }
        };
        let score = match obj.get("score") {
            None => None,
            Some(v) if v.is_null() => None,
            Some(v) => match v.as_f64() {
                Some(n) => Some(n),
                None => {
                    return Err(ScheduleError::with_details(
                        "bad_params",
                        "score must be a number",
                        json!({ "index": i }),
                    ))
                }
            },
        };
        out.push(ScoreEntry { title, score });
    }
    Ok(out)
}

pub fn parse_overall_score(raw: Option<&serde_json::Value>) -> Result<Option<f64>, ScheduleError> {
    match raw {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => match v.as_f64() {
            Some(n) => Ok(Some(n)),
            None => Err(ScheduleError::new("bad_params", "overallScore must be a number")),
        },
    }
}

fn value_as_id(v: &serde_json::Value) -> Option<String> {
    if let Some(s) = v.as_str() {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        return Some(trimmed.to_string());
    }
    v.as_i64().map(|n| n.to_string())
}

pub fn parse_units(raw: Option<&serde_json::Value>) -> Result<Vec<UnitDescriptor>, ScheduleError> {
    let Some(arr) = raw.and_then(|v| v.as_array()) else {
        return Err(ScheduleError::new("bad_params", "units must be an array"));
    };
    let mut out = Vec::with_capacity(arr.len());
    for (i, v) in arr.iter().enumerate() {
        let Some(obj) = v.as_object() else {
            return Err(ScheduleError::with_details(
                "bad_params",
                "units entries must be objects",
                json!({ "index": i }),
            ));
        };
        let Some(id) = obj.get("id").and_then(value_as_id) else {
            return Err(ScheduleError::with_details(
                "bad_params",
                "unit id must be a non-empty string or integer",
                json!({ "index": i }),
            ));
        };
        let Some(tag) = obj.get("type").and_then(|v| v.as_str()) else {
            return Err(ScheduleError::with_details(
                "bad_params",
                "unit type must be a string",
                json!({ "index": i, "unitId": id }),
            ));
        };
        out.push(UnitDescriptor {
            id,
            index: obj.get("index").and_then(|v| v.as_i64()).unwrap_or(0),
            title: obj
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            unit_type: UnitType::from_tag(tag),
            now_available: obj
                .get("nowAvailable")
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
            href: obj.get("href").and_then(|v| v.as_str()).map(|s| s.to_string()),
            release_date: obj
                .get("releaseDate")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        });
    }
    Ok(out)
}

pub fn parse_progress(raw: Option<&serde_json::Value>) -> Result<ProgressMap, ScheduleError> {
    let Some(raw) = raw else {
        return Ok(ProgressMap::new());
    };
    if raw.is_null() {
        return Ok(ProgressMap::new());
    }
    let Some(obj) = raw.as_object() else {
        return Err(ScheduleError::new("bad_params", "progress must be an object"));
    };
    let mut map = ProgressMap::new();
    for (id, v) in obj {
        let Some(value) = v.as_i64() else {
            return Err(ScheduleError::with_details(
                "bad_params",
                "progress values must be integers",
                json!({ "unitId": id }),
            ));
        };
        map.set(id.clone(), value);
    }
    Ok(map)
}

pub fn parse_viewer(raw: Option<&serde_json::Value>) -> Result<ViewerContext, ScheduleError> {
    let Some(obj) = raw.and_then(|v| v.as_object()) else {
        return Err(ScheduleError::new("bad_params", "viewer must be an object"));
    };
    let role = match obj.get("role").and_then(|v| v.as_str()) {
        Some("course_admin") | Some("admin") => ViewerRole::CourseAdmin,
        Some("regular") => ViewerRole::Regular,
        Some(other) => {
            return Err(ScheduleError::with_details(
                "bad_params",
                format!("unknown viewer role: {}", other),
                json!({ "role": other }),
            ))
        }
        None => return Err(ScheduleError::new("bad_params", "viewer.role must be a string")),
    };
    let Some(tracking_enabled) = obj.get("trackingEnabled").and_then(|v| v.as_bool()) else {
        return Err(ScheduleError::new(
            "bad_params",
            "viewer.trackingEnabled must be a boolean",
        ));
    };
    Ok(ViewerContext {
        role,
        tracking_enabled,
    })
}
