//! Integration tests for Configuration System

use dkr::cli::{load_config, Cli};
use crate::integration::test_utils::with_dkr_env;
use dkr::config::ConfigLoader;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_config_file_sections() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("test_config.toml");

    std::fs::write(
        &config_file,
        r#"
[engine]
host = "unix:///run/user/1000/docker.sock"
timeout_secs = 30

[state]
file = "/tmp/dkr-test/state.json"

[commands]
user_dir = "/tmp/dkr-test/commands"

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = with_dkr_env(&temp_dir, &[], || {
        ConfigLoader::load_from_file(&config_file).unwrap()
    });
    assert_eq!(
        config.engine.host.as_deref(),
        Some("unix:///run/user/1000/docker.sock")
    );
    assert_eq!(config.engine.timeout_secs, 30);
    assert_eq!(
        config.state_file().unwrap(),
        PathBuf::from("/tmp/dkr-test/state.json")
    );
    assert_eq!(
        config.user_commands_dir().unwrap(),
        PathBuf::from("/tmp/dkr-test/commands")
    );
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.logging.output, "stderr");
}

#[test]
fn test_host_flag_overrides_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("dkr.toml");
    std::fs::write(&config_file, "[engine]\nhost = \"tcp://10.0.0.1:2375\"\n").unwrap();
    let config_arg = config_file.to_string_lossy().to_string();

    let cli = Cli::pre_parse(["dkr", "--config", config_arg.as_str(), "image", "list"]);
    let config = with_dkr_env(&temp_dir, &[], || load_config(&cli).unwrap());
    assert_eq!(config.engine.host.as_deref(), Some("tcp://10.0.0.1:2375"));

    let cli = Cli::pre_parse([
        "dkr",
        "--config",
        config_arg.as_str(),
        "--host",
        "tcp://10.0.0.2:2375",
        "image",
        "list",
    ]);
    let config = with_dkr_env(&temp_dir, &[], || load_config(&cli).unwrap());
    assert_eq!(config.engine.host.as_deref(), Some("tcp://10.0.0.2:2375"));
}

#[test]
fn test_home_config_and_env_layers() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("config.toml"),
        "[engine]\nhost = \"tcp://10.0.0.1:2375\"\ntimeout_secs = 15\n",
    )
    .unwrap();

    let config = with_dkr_env(&home, &[], || ConfigLoader::load().unwrap());
    assert_eq!(config.engine.host.as_deref(), Some("tcp://10.0.0.1:2375"));
    assert_eq!(config.engine.timeout_secs, 15);

    let config = with_dkr_env(&home, &[("DKR_ENGINE__HOST", "tcp://10.0.0.9:2375")], || {
        ConfigLoader::load().unwrap()
    });
    assert_eq!(config.engine.host.as_deref(), Some("tcp://10.0.0.9:2375"));
    assert_eq!(config.engine.timeout_secs, 15);
}

#[test]
fn test_default_paths_follow_dkr_home() {
    let home = TempDir::new().unwrap();
    let config = with_dkr_env(&home, &[], || {
        let config = ConfigLoader::load().unwrap();
        (config.state_file().unwrap(), config.user_commands_dir().unwrap())
    });
    assert_eq!(config.0, home.path().join("state.json"));
    assert_eq!(config.1, home.path().join("commands"));
}

#[test]
fn test_missing_config_file_is_error() {
    let cli = Cli::pre_parse(["dkr", "--config", "/nonexistent/dkr.toml", "image", "list"]);
    let err = load_config(&cli).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}
