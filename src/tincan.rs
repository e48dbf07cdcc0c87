use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

pub const VERB_COMPLETED: &str = "http://adlnet.gov/expapi/verbs/completed";
pub const VERB_ANSWERED: &str = "http://adlnet.gov/expapi/verbs/answered";
pub const VERB_WATCHED: &str = "http://saltbox.com/verbs/assessment#watched";
pub const VERB_CHECKED_ANSWER: &str = "http://saltbox.com/verbs/assessment#checked_answer";
pub const VERB_SKIPPED_ANSWER: &str = "http://saltbox.com/verbs/assessment#skipped_answer";
pub const VERB_CHECKED_ASSESSMENT: &str = "http://saltbox.com/verbs/assessment#checked_assessment";

#[derive(Debug, Clone)]
pub struct CourseActivity {
    pub uri: String,
    pub name: String,
    pub description: String,
}

impl CourseActivity {
    fn to_value(&self) -> Value {
        json!({
            "id": self.uri,
            "definition": {
                "name": { "en": self.name },
                "description": { "en": self.description }
            }
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CourseResult {
    pub score_scaled: f64,
    pub success: bool,
}

#[derive(Debug, Clone)]
pub struct AssessmentSubmission {
    pub student_key: String,
    pub assessment_type: String,
    pub assessment_uri: String,
    /// Percentage in [0,100]; scaled to [0,1] on the wire.
    pub score: f64,
    /// Per-question success flags in question order.
    pub question_results: Vec<bool>,
    /// Present only for the course-final assessments, where the submission
    /// also completes the course.
    pub course_result: Option<CourseResult>,
}

/// Fallback for activity ids the caller cannot determine (the original used
/// the HTTP referer and fell back to a random urn).
pub fn activity_uri_or_random(uri: Option<&str>) -> String {
    match uri {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => format!("urn:uuid:{}", Uuid::new_v4()),
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn actor(student_key: &str) -> Value {
    json!({ "mbox": format!("mailto:{}", student_key) })
}

fn verb(id: &str, display: &str) -> Value {
    json!({ "id": id, "display": { "en": display } })
}

fn statement_id() -> String {
    Uuid::new_v4().to_string()
}

/// Statement batch for an assessment submission: one "completed" statement
/// for the assessment, an optional course-completion statement, and one
/// "answered" statement per question.
pub fn assessment_statements(
    submission: &AssessmentSubmission,
    course: &CourseActivity,
    now: DateTime<Utc>,
) -> Vec<Value> {
    let ts = timestamp(now);
    let actor = actor(&submission.student_key);
    let assessment_activity = json!({
        "id": submission.assessment_uri,
        "definition": {
            "name": {
                "en": format!("{} assessment", submission.assessment_type)
            }
        }
    });

    let mut statements = vec![json!({
        "timestamp": ts.clone(),
        "id": statement_id(),
        "actor": actor.clone(),
        "verb": verb(VERB_COMPLETED, "completed"),
        "object": assessment_activity.clone(),
        "result": {
            "score": { "scaled": submission.score / 100.0 },
            "completion": true
        },
        "context": {
            "contextActivities": { "parent": course.to_value() }
        }
    })];

    if let Some(course_result) = submission.course_result {
        statements.push(json!({
            "timestamp": ts.clone(),
            "id": statement_id(),
            "actor": actor.clone(),
            "verb": verb(VERB_COMPLETED, "completed"),
            "object": course.to_value(),
            "result": {
                "score": { "scaled": course_result.score_scaled },
                "success": course_result.success,
                "completion": true
            }
        }));
    }

    for (question, success) in submission.question_results.iter().enumerate() {
        statements.push(json!({
            "timestamp": ts.clone(),
            "id": statement_id(),
            "actor": actor.clone(),
            "verb": verb(VERB_ANSWERED, "answered"),
            "object": {
                "id": format!("{}#{}", submission.assessment_uri, question),
                "definition": {
                    "name": {
                        "en": format!(
                            "{} question #{}",
                            submission.assessment_type, question
                        )
                    }
                }
            },
            "result": {
                "completion": true,
                "success": success
            },
            "context": {
                "contextActivities": {
                    "parent": assessment_activity.clone(),
                    "other": course.to_value()
                }
            }
        }));
    }

    statements
}

pub fn watched_video_statement(
    student_key: &str,
    video_uri: &str,
    duration_secs: i64,
    completion: bool,
    parent_uri: &str,
    course: &CourseActivity,
    now: DateTime<Utc>,
) -> Value {
    json!({
        "timestamp": timestamp(now),
        "id": statement_id(),
        "actor": actor(student_key),
        "verb": verb(VERB_WATCHED, "watched"),
        "object": { "id": video_uri },
        "result": {
            "completion": completion,
            "duration": format!("PT{}S", duration_secs)
        },
        "context": {
            "contextActivities": {
                "parent": { "id": parent_uri },
                "other": course.to_value()
            }
        }
    })
}

pub fn checked_answer_statement(
    student_key: &str,
    question: &str,
    success: bool,
    skipped: bool,
    parent_uri: &str,
    course: &CourseActivity,
    now: DateTime<Utc>,
) -> Value {
    let (verb_uri, verb_display) = if skipped {
        (VERB_SKIPPED_ANSWER, "skipped")
    } else {
        (VERB_CHECKED_ANSWER, "checked answer for")
    };
    json!({
        "timestamp": timestamp(now),
        "id": statement_id(),
        "actor": actor(student_key),
        "verb": verb(verb_uri, verb_display),
        "object": {
            "id": format!("{}#{}", parent_uri, question),
            "definition": {
                "name": {
                    "en": format!("{} question tag #{}", parent_uri, question)
                }
            }
        },
        "result": {
            "completion": false,
            "success": success
        },
        "context": {
            "contextActivities": {
                "parent": { "id": parent_uri },
                "other": course.to_value()
            }
        }
    })
}

pub fn assessment_check_statement(
    student_key: &str,
    score_scaled: f64,
    activity_uri: &str,
    course: &CourseActivity,
    now: DateTime<Utc>,
) -> Value {
    json!({
        "timestamp": timestamp(now),
        "id": statement_id(),
        "actor": actor(student_key),
        "verb": verb(VERB_CHECKED_ASSESSMENT, "checked assessment"),
        "object": { "id": activity_uri },
        "result": {
            "completion": false,
            "score": { "scaled": score_scaled }
        },
        "context": {
            "contextActivities": { "other": course.to_value() }
        }
    })
}
