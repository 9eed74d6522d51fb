//! Session state carried between invocations

use crate::integration::test_utils::{StubEngine, TestHome};
use serde_json::json;

#[test]
fn test_default_stop_time_seeded_on_first_run() {
    let home = TestHome::new();
    let output = home.run(&StubEngine::new(), &["image", "list"]);
    assert_eq!(output.code, 0);
    assert_eq!(home.state()["default_stop_time"], json!(3600));
}

#[test]
fn test_placeholder_uses_last_container_from_previous_run() {
    let home = TestHome::new();
    let engine = StubEngine::new();

    let first = home.run(&engine, &["container", "start", "web"]);
    assert_eq!(first.code, 0);
    assert_eq!(home.state()["last_container"], json!("web"));

    let second = home.run(&engine, &["container", "stop", "-"]);
    assert_eq!(second.code, 0);
    assert_eq!(
        engine.calls(),
        vec!["start_container web", "stop_container web t=3600"]
    );
}

#[test]
fn test_stored_stop_time_becomes_default() {
    let home = TestHome::new();
    home.write_state(json!({"default_stop_time": 7, "last_container": "db"}));
    let engine = StubEngine::new();
    let output = home.run(&engine, &["c", "stop", "-"]);
    assert_eq!(output.code, 0);
    assert_eq!(engine.calls(), vec!["stop_container db t=7"]);
}

#[test]
fn test_placeholder_without_state_fails_without_engine_call() {
    let home = TestHome::new();
    let engine = StubEngine::new();
    let output = home.run(&engine, &["container", "start", "-"]);
    assert_eq!(output.code, 1);
    assert!(engine.calls().is_empty());
}

#[test]
fn test_create_records_image_and_container() {
    let home = TestHome::new();
    let engine = StubEngine::new();
    let output = home.run(&engine, &["container", "create", "--id", "nginx"]);
    assert_eq!(output.code, 0);
    assert_eq!(output.out, "stub0001\n");
    let state = home.state();
    assert_eq!(state["last_image"], json!("nginx"));
    assert_eq!(state["last_container"], json!("stub0001"));
}

#[test]
fn test_removing_last_container_clears_it() {
    let home = TestHome::new();
    home.write_state(json!({"last_container": "web", "unrelated": [1, 2]}));
    let output = home.run(&StubEngine::new(), &["container", "rm", "-"]);
    assert_eq!(output.code, 0);
    assert_eq!(output.out, "web\n");
    let state = home.state();
    assert!(state.get("last_container").is_none());
    assert_eq!(state["unrelated"], json!([1, 2]));
}

#[test]
fn test_state_saved_when_command_fails() {
    let home = TestHome::new();
    let engine = StubEngine::new().failing(
        "broken",
        dkr::error::EngineError::from_status(500, "boom"),
    );
    let output = home.run(&engine, &["container", "start", "fine", "broken"]);
    assert_eq!(output.code, 2);
    assert_eq!(home.state()["last_container"], json!("broken"));
}

#[test]
fn test_corrupt_state_file_is_reported() {
    let home = TestHome::new();
    std::fs::write(home.state_file(), "[1, 2, 3]").unwrap();
    let output = home.run(&StubEngine::new(), &["image", "list"]);
    assert_eq!(output.code, 1);
    assert!(output.err.contains("must contain a JSON object"));
}
