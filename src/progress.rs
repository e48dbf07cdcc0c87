use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

pub const EVENT_SET_UNIT_PROGRESS: &str = "set-unit-progress";
pub const EVENT_SUBMIT_ASSESSMENT: &str = "submit-assessment";

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Upserts a lesson-unit progress value (0 = not started, 1 = in progress,
/// 2 = completed). Domain checks belong to the caller; this layer stores
/// whatever it is handed.
pub fn set_unit_progress(
    conn: &Connection,
    student_key: &str,
    unit_id: &str,
    value: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO unit_progress(student_key, unit_id, value, updated_at)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(student_key, unit_id) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        (student_key, unit_id, value, now_stamp()),
    )?;
    record_event(
        conn,
        EVENT_SET_UNIT_PROGRESS,
        student_key,
        json!({ "unitId": unit_id, "value": value }),
    )
}

/// Marks an assessment completed for a student. Repeat submissions bump the
/// counter; any stored value above zero reads as completed.
pub fn put_assessment_completed(
    conn: &Connection,
    student_key: &str,
    unit_id: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO unit_progress(student_key, unit_id, value, updated_at)
         VALUES(?, ?, 1, ?)
         ON CONFLICT(student_key, unit_id) DO UPDATE SET
           value = unit_progress.value + 1,
           updated_at = excluded.updated_at",
        (student_key, unit_id, now_stamp()),
    )?;
    let value: i64 = conn.query_row(
        "SELECT value FROM unit_progress WHERE student_key = ? AND unit_id = ?",
        (student_key, unit_id),
        |r| r.get(0),
    )?;
    record_event(
        conn,
        EVENT_SUBMIT_ASSESSMENT,
        student_key,
        json!({ "unitId": unit_id, "value": value }),
    )?;
    Ok(value)
}

pub fn unit_progress_map(
    conn: &Connection,
    student_key: &str,
) -> rusqlite::Result<HashMap<String, i64>> {
    let mut stmt =
        conn.prepare("SELECT unit_id, value FROM unit_progress WHERE student_key = ?")?;
    let rows = stmt.query_map([student_key], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
    rows.collect()
}

fn record_event(
    conn: &Connection,
    kind: &str,
    student_key: &str,
    payload: serde_json::Value,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO events(id, kind, student_key, payload, recorded_at)
         VALUES(?, ?, ?, ?, ?)",
        (
            Uuid::new_v4().to_string(),
            kind,
            student_key,
            payload.to_string(),
            now_stamp(),
        ),
    )?;
    Ok(())
}
