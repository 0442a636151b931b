//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn skillfuzz() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("skillfuzz").unwrap()
}

const TOPIC_REQUEST: &str = r#"{
    "user_id": "user-1",
    "topic_scores": {"algebra": 40, "geometry": 5},
    "total_time": 900,
    "wrong_questions_data": {"algebra": [{"point": 20}]}
}"#;

const QUIZ_REQUEST: &str = r#"{
    "total_score": 260,
    "total_time": 500,
    "topic_scores": {"algebra": 60}
}"#;

/// A working directory with the built-in pipelines written by `init`.
fn initialized_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    skillfuzz()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
    dir
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();
    skillfuzz()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created skillfuzz.toml"));

    assert!(dir.path().join("skillfuzz.toml").exists());
    assert!(dir.path().join("pipelines/topic.toml").exists());
    assert!(dir.path().join("pipelines/quiz.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = initialized_dir();
    skillfuzz()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists, skipping"));
}

#[test]
fn validate_topic_pipeline() {
    let dir = initialized_dir();
    skillfuzz()
        .current_dir(dir.path())
        .args(["validate", "--pipeline", "pipelines/topic.toml", "--variant", "topic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7 rules"))
        .stdout(predicate::str::contains("Pipeline valid"));
}

#[test]
fn validate_quiz_pipeline_reports_unused_label() {
    let dir = initialized_dir();
    skillfuzz()
        .current_dir(dir.path())
        .args(["validate", "--pipeline", "pipelines/quiz.toml", "--variant", "quiz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("14 rules"))
        .stdout(predicate::str::contains("[total_score] WARNING"));
}

#[test]
fn validate_rejects_wrong_variant() {
    let dir = initialized_dir();
    skillfuzz()
        .current_dir(dir.path())
        .args(["validate", "--pipeline", "pipelines/quiz.toml", "--variant", "topic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("penalty"));
}

#[test]
fn validate_nonexistent_file() {
    skillfuzz()
        .args(["validate", "--pipeline", "/nonexistent/quiz.toml", "--variant", "quiz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn score_topic_request() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("request.json");
    std::fs::write(&input, TOPIC_REQUEST).unwrap();

    skillfuzz()
        .current_dir(dir.path())
        .args(["score", "--variant", "topic", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("algebra"))
        .stdout(predicate::str::contains("Advanced"))
        .stdout(predicate::str::contains("Beginner"))
        .stdout(predicate::str::contains("overall Intermediate"));
}

#[test]
fn score_directory_and_save_report() {
    let dir = TempDir::new().unwrap();
    let requests = dir.path().join("requests");
    std::fs::create_dir_all(&requests).unwrap();
    std::fs::write(requests.join("a.json"), QUIZ_REQUEST).unwrap();
    std::fs::write(requests.join("b.json"), QUIZ_REQUEST).unwrap();
    let output = dir.path().join("reports");

    skillfuzz()
        .current_dir(dir.path())
        .args(["score", "--variant", "quiz", "--parallelism", "2", "--input"])
        .arg(&requests)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("overall Advanced"));

    let reports: Vec<_> = std::fs::read_dir(&output).unwrap().collect();
    assert_eq!(reports.len(), 1);
    let path = reports[0].as_ref().unwrap().path();
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(report["variant"], "quiz");
    assert_eq!(report["results"].as_array().unwrap().len(), 2);
    assert_eq!(report["results"][0]["assessment"]["overall"], "Advanced");
}

#[test]
fn score_fails_on_unscorable_request() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("request.json");
    std::fs::write(
        &input,
        r#"{"total_score": 0, "total_time": 5000, "topic_scores": {"algebra": 35}}"#,
    )
    .unwrap();

    skillfuzz()
        .current_dir(dir.path())
        .args(["score", "--variant", "quiz", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("no rule fired"))
        .stderr(predicate::str::contains("could not be scored"));
}

#[test]
fn score_with_custom_pipeline() {
    let dir = initialized_dir();
    let path = dir.path().join("pipelines/quiz.toml");
    let strict = std::fs::read_to_string(&path).unwrap().replace(
        "levels = { advanced = 50, intermediate = 25 }",
        "levels = { advanced = 65, intermediate = 25 }",
    );
    std::fs::write(&path, strict).unwrap();
    std::fs::write(dir.path().join("request.json"), QUIZ_REQUEST).unwrap();

    // skillfuzz.toml written by init points at the edited file
    skillfuzz()
        .current_dir(dir.path())
        .args(["score", "--variant", "quiz", "--input", "request.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("overall Intermediate"));
}

#[test]
fn unknown_variant_is_rejected() {
    skillfuzz()
        .args(["score", "--variant", "both", "--input", "request.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown variant"));
}
