mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

fn course() -> serde_json::Value {
    json!({
        "uri": "https://course.example.org",
        "name": "Sample Course",
        "description": "A sample"
    })
}

#[test]
fn assessment_submission_builds_statement_batch() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "tincan.assessment",
        json!({
            "studentKey": "learner@example.com",
            "assessmentType": "precourse",
            "assessmentUri": "https://course.example.org/assessment?name=1",
            "score": 80,
            "questionResults": [true, false, true],
            "course": course()
        }),
    );
    let statements = result["statements"].as_array().expect("statements");
    // One completed statement plus one answered statement per question.
    assert_eq!(statements.len(), 4);
    assert_eq!(
        statements[0]["verb"]["id"].as_str(),
        Some("http://adlnet.gov/expapi/verbs/completed")
    );
    assert_eq!(
        statements[0]["actor"]["mbox"].as_str(),
        Some("mailto:learner@example.com")
    );
    assert!(
        (statements[0]["result"]["score"]["scaled"].as_f64().unwrap() - 0.8).abs() < 1e-9
    );
    assert_eq!(
        statements[1]["verb"]["id"].as_str(),
        Some("http://adlnet.gov/expapi/verbs/answered")
    );
    assert_eq!(statements[2]["result"]["success"].as_bool(), Some(false));

    // Final assessments also complete the course.
    let result = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "tincan.assessment",
        json!({
            "studentKey": "learner@example.com",
            "assessmentType": "postcourse_pass",
            "score": 90,
            "course": course(),
            "courseResult": { "scoreScaled": 0.9, "success": true }
        }),
    );
    let statements = result["statements"].as_array().expect("statements");
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[1]["object"]["id"].as_str(),
        Some("https://course.example.org")
    );
    assert_eq!(statements[1]["result"]["success"].as_bool(), Some(true));
    // No assessment URI was supplied, so a urn:uuid fallback is generated.
    assert!(statements[0]["object"]["id"]
        .as_str()
        .unwrap()
        .starts_with("urn:uuid:"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn watch_video_and_answer_checks_build_single_statements() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "tincan.watchVideo",
        json!({
            "studentKey": "learner@example.com",
            "video": "https://video.example.org/v1",
            "duration": 95,
            "completion": true,
            "parentUri": "https://course.example.org/unit?unit=2",
            "course": course()
        }),
    );
    let statement = &result["statements"][0];
    assert_eq!(
        statement["verb"]["id"].as_str(),
        Some("http://saltbox.com/verbs/assessment#watched")
    );
    assert_eq!(statement["result"]["duration"].as_str(), Some("PT95S"));

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "tincan.checkAnswer",
        json!({
            "studentKey": "learner@example.com",
            "question": "3",
            "success": false,
            "skipped": true,
            "parentUri": "https://course.example.org/assessment?name=1",
            "course": course()
        }),
    );
    let statement = &result["statements"][0];
    assert_eq!(
        statement["verb"]["id"].as_str(),
        Some("http://saltbox.com/verbs/assessment#skipped_answer")
    );
    assert!(statement["object"]["id"].as_str().unwrap().ends_with("#3"));

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "tincan.assessmentCheck",
        json!({
            "studentKey": "learner@example.com",
            "scoreScaled": 0.4,
            "course": course()
        }),
    );
    let statement = &result["statements"][0];
    assert_eq!(
        statement["verb"]["id"].as_str(),
        Some("http://saltbox.com/verbs/assessment#checked_assessment")
    );
    assert_eq!(statement["result"]["completion"].as_bool(), Some(false));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn statements_require_student_and_course() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "tincan.assessment",
        json!({
            "assessmentType": "precourse",
            "score": 80,
            "course": course()
        }),
    );
    assert_eq!(error["code"].as_str(), Some("bad_params"));

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "tincan.watchVideo",
        json!({
            "studentKey": "learner@example.com",
            "video": "https://video.example.org/v1",
            "duration": 95
        }),
    );
    assert_eq!(error["code"].as_str(), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
}
