//! Tests for error types

use runlens::store::ArtifactStore;
use runlens::Error;

#[test]
fn test_artifact_parse_error() {
    let error = Error::artifact_parse("timers.json", "expected value at line 1");
    let error_str = format!("{error}");
    assert!(error_str.contains("Corrupted timers.json"));
    assert!(error_str.contains("expected value at line 1"));
}

#[test]
fn test_run_not_found_error() {
    let error = Error::RunNotFound("ppo_run_3".to_string());
    assert_eq!(format!("{error}"), "Run not found: ppo_run_3");
}

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("workers must be at least 1".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid input"));
    assert!(error_str.contains("workers must be at least 1"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_yaml_error_conversion() {
    let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("a: [1, 2").unwrap_err();
    let error: Error = yaml_error.into();
    assert!(format!("{error}").contains("YAML error"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom error message".to_string());
    let error_str = format!("{error}");
    assert_eq!(error_str, "custom error message");
}

#[test]
fn test_malformed_artifact_surfaces_as_parse_error() {
    let temp = tempfile::TempDir::new().unwrap();
    let logs = temp.path().join("run_a/run_logs");
    std::fs::create_dir_all(&logs).unwrap();
    std::fs::write(logs.join("episode_data.json"), "{\"episodes\": [").unwrap();

    let store = ArtifactStore::new(temp.path());
    let result = runlens::series::load_episodes(&store, "run_a");
    match result {
        Err(Error::ArtifactParse { artifact, .. }) => assert_eq!(artifact, "episode_data.json"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_error_debug() {
    let error = Error::RunNotFound("x".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("RunNotFound"));
}
