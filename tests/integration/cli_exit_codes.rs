//! Exit codes and stream routing for whole invocations

use crate::integration::test_utils::{StubEngine, TestHome};
use dkr::error::EngineError;

#[test]
fn test_no_command_prints_hint_and_succeeds() {
    let home = TestHome::new();
    let output = home.run(&StubEngine::new(), &[]);
    assert_eq!(output.code, 0);
    assert!(output.out.is_empty());
    assert_eq!(
        output.err.trim(),
        "No valid command specified. `dkr -h` for help."
    );
}

#[test]
fn test_noun_without_verb_prints_noun_hint() {
    let home = TestHome::new();
    let output = home.run(&StubEngine::new(), &["container"]);
    assert_eq!(output.code, 0);
    assert!(output.err.contains("`dkr container -h` for help."));
}

#[test]
fn test_unknown_command_is_usage_error() {
    let home = TestHome::new();
    let engine = StubEngine::new();
    let output = home.run(&engine, &["bogus"]);
    assert_eq!(output.code, 1);
    assert!(output.err.contains("bogus"));
    assert!(engine.calls().is_empty());
}

#[test]
fn test_help_goes_to_stdout() {
    let home = TestHome::new();
    let output = home.run(&StubEngine::new(), &["--help"]);
    assert_eq!(output.code, 0);
    assert!(output.out.contains("container"));
    assert!(output.out.contains("image"));
    assert!(output.out.contains("Alias for \"container\""));
}

#[test]
fn test_list_quiet_prints_ids() {
    let home = TestHome::new();
    let engine = StubEngine::new()
        .with_container("aaaa", "web")
        .with_container("bbbb", "db");
    let output = home.run(&engine, &["c", "list", "-a", "-q"]);
    assert_eq!(output.code, 0);
    assert_eq!(output.out, "aaaa\nbbbb\n");
    assert_eq!(engine.calls(), vec!["list_containers all=true"]);
}

#[test]
fn test_not_found_is_input_error() {
    let home = TestHome::new();
    let engine = StubEngine::new().failing(
        "ghost",
        EngineError::from_status(404, "No such container: ghost"),
    );
    let output = home.run(&engine, &["container", "start", "ghost"]);
    assert_eq!(output.code, 1);
    assert!(output.err.contains("No such container: ghost"));
}

#[test]
fn test_engine_failure_wins_over_input_failure() {
    let home = TestHome::new();
    let engine = StubEngine::new()
        .failing("ghost", EngineError::from_status(404, "No such container: ghost"))
        .failing("sick", EngineError::from_status(500, "driver failed"));
    let output = home.run(&engine, &["container", "stop", "ghost", "ok", "sick"]);
    assert_eq!(output.code, 2);
    assert_eq!(output.out, "ok\n");
    assert!(output.err.contains("driver failed"));
    assert!(!output.err.contains("operations failed"));
    assert_eq!(engine.calls().len(), 3);
}

#[test]
fn test_invalid_port_fails_before_engine() {
    let home = TestHome::new();
    let engine = StubEngine::new();
    let output = home.run(&engine, &["c", "create", "-p", "80:http", "nginx"]);
    assert_eq!(output.code, 1);
    assert!(engine.calls().is_empty());
}

#[test]
fn test_image_pull_prints_progress() {
    let home = TestHome::new();
    let engine = StubEngine::new().with_pull_records(vec![dkr::engine::PullProgress {
        status: Some("Status: Downloaded newer image".to_string()),
        ..Default::default()
    }]);
    let output = home.run(&engine, &["image", "pull", "alpine"]);
    assert_eq!(output.code, 0);
    assert!(output.out.starts_with("Pulling alpine:latest\n"));
    assert!(output.out.contains("Status: Downloaded newer image"));
}
