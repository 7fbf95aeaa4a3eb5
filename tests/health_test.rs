//! Health classification against fixture run directories

use runlens::artifact::ParsedRun;
use runlens::health::{classify, CheckStage, FailureReason, HealthThresholds, HealthWarning, RunMode};
use runlens::schema::{Provenance, TagMatch};
use runlens::store::{ArtifactKind, ArtifactStore, RunOrdering};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = "behaviors:\n  Foo:\n    trainer_type: ppo\n    max_steps: 500000\n";
const INFERENCE_CONFIG: &str =
    "behaviors:\n  Foo:\n    trainer_type: ppo\ncheckpoint_settings:\n  inference: true\n";

fn timers(reward: f64, duration: u64) -> String {
    format!(
        r#"{{
            "gauges": {{"Foo.Environment.CumulativeReward.mean": {{"value": {reward}, "min": 0.0, "max": {reward}, "count": 10}}}},
            "metadata": {{"start_time_seconds": "1700000000", "end_time_seconds": "{}"}}
        }}"#,
        1_700_000_000 + duration
    )
}

fn status(checkpoints: usize) -> String {
    let entries: Vec<String> = (1..=checkpoints)
        .map(|i| format!(r#"{{"steps": {}, "reward": 1.5, "creation_time": 1700000100.0}}"#, i * 1000))
        .collect();
    format!(r#"{{"Foo": {{"checkpoints": [{}]}}, "metadata": {{"stats_format_version": "0.3.0"}}}}"#, entries.join(","))
}

fn write(run_dir: &Path, kind: ArtifactKind, contents: &str) {
    let path = kind.path_in(run_dir);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn run_dir(root: &TempDir, run_id: &str) -> std::path::PathBuf {
    let dir = root.path().join(run_id);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn classify_run(root: &TempDir, run_id: &str) -> runlens::health::HealthVerdict {
    let store = ArtifactStore::new(root.path());
    let artifacts = store.run(run_id).expect("run directory exists");
    classify(&ParsedRun::load(artifacts), &HealthThresholds::default())
}

fn complete_run(root: &TempDir, run_id: &str, config: &str, reward: f64, duration: u64, checkpoints: usize) {
    let dir = run_dir(root, run_id);
    write(&dir, ArtifactKind::Config, config);
    write(&dir, ArtifactKind::Timers, &timers(reward, duration));
    write(&dir, ArtifactKind::TrainingStatus, &status(checkpoints));
}

// ============================================================================
// Healthy runs
// ============================================================================

#[test]
fn test_healthy_run() {
    let root = TempDir::new().unwrap();
    complete_run(&root, "ppo_ok", CONFIG, 9.9, 120, 3);

    let verdict = classify_run(&root, "ppo_ok");
    assert!(!verdict.is_failed, "unexpected failures: {:?}", verdict.failures);
    assert_eq!(verdict.reward, Some(9.9));
    assert_eq!(verdict.reward_provenance, Some(Provenance::Observed));
    assert_eq!(
        verdict.reward_source,
        Some(TagMatch::Exact("Foo.Environment.CumulativeReward.mean".to_string()))
    );
    assert_eq!(verdict.duration_seconds, Some(120.0));
    assert_eq!(verdict.checkpoint_count, 3);
    assert_eq!(verdict.summary(), "[OK] 9.90");
    assert_eq!(verdict.stage, CheckStage::Metrics);
}

#[test]
fn test_tiny_run_is_warned_not_failed() {
    let root = TempDir::new().unwrap();
    complete_run(&root, "tiny", CONFIG, 2.0, 60, 1);

    let verdict = classify_run(&root, "tiny");
    assert!(!verdict.is_failed);
    assert!(verdict
        .warnings
        .iter()
        .any(|w| matches!(w, HealthWarning::SmallSize(_))));
}

#[test]
fn test_inference_run_without_checkpoints() {
    let root = TempDir::new().unwrap();
    complete_run(&root, "eval_run", INFERENCE_CONFIG, 4.0, 60, 0);

    let verdict = classify_run(&root, "eval_run");
    assert!(!verdict.is_failed);
    assert!(verdict.warnings.contains(&HealthWarning::NoCheckpointsInference));
    let mode = verdict.mode.unwrap();
    assert_eq!(mode.value, RunMode::Inference);
    assert_eq!(mode.provenance, Provenance::Observed);
}

#[test]
fn test_unmeasurable_duration_is_not_a_crash() {
    let root = TempDir::new().unwrap();
    let dir = run_dir(&root, "no_timing");
    write(&dir, ArtifactKind::Config, CONFIG);
    write(
        &dir,
        ArtifactKind::Timers,
        r#"{"gauges": {"Foo.Environment.CumulativeReward.mean": {"value": 1.0}}, "metadata": {"start_time_seconds": "1700000000"}}"#,
    );
    write(&dir, ArtifactKind::TrainingStatus, &status(1));

    let verdict = classify_run(&root, "no_timing");
    assert!(!verdict.is_failed);
    assert_eq!(verdict.duration_seconds, None);
}

// ============================================================================
// Metric failures
// ============================================================================

#[test]
fn test_negative_reward() {
    let root = TempDir::new().unwrap();
    complete_run(&root, "neg", CONFIG, -1.0, 120, 3);

    let verdict = classify_run(&root, "neg");
    assert!(verdict.is_failed);
    assert_eq!(verdict.failures, vec![FailureReason::NonPositiveReward(-1.0)]);
    assert_eq!(verdict.failures[0].to_string(), "zero or negative reward: -1.00");
}

#[test]
fn test_metric_checks_are_all_evaluated() {
    let root = TempDir::new().unwrap();
    complete_run(&root, "bad", CONFIG, 0.0, 5, 0);

    let verdict = classify_run(&root, "bad");
    assert_eq!(
        verdict.failures,
        vec![
            FailureReason::NonPositiveReward(0.0),
            FailureReason::CrashedImmediately(5.0),
            FailureReason::NoCheckpoints,
        ]
    );
    assert_eq!(
        verdict.summary(),
        "[FAIL] zero or negative reward: 0.00, run crashed immediately (duration: 5.0s)"
    );
}

#[test]
fn test_no_reward_metric() {
    let root = TempDir::new().unwrap();
    let dir = run_dir(&root, "silent");
    write(&dir, ArtifactKind::Config, CONFIG);
    write(&dir, ArtifactKind::Timers, r#"{"gauges": {"Foo.Policy.Entropy.mean": {"value": 1.4}}}"#);
    write(&dir, ArtifactKind::TrainingStatus, &status(2));

    let verdict = classify_run(&root, "silent");
    assert_eq!(verdict.failures, vec![FailureReason::NoRewardMetric]);
    assert_eq!(verdict.reward, None);
    assert_eq!(verdict.reward_provenance, None);
}

#[test]
fn test_reward_gauge_without_value_is_defaulted() {
    let root = TempDir::new().unwrap();
    let dir = run_dir(&root, "valueless");
    write(&dir, ArtifactKind::Config, CONFIG);
    write(
        &dir,
        ArtifactKind::Timers,
        r#"{"gauges": {"Foo.Environment.CumulativeReward.mean": {"count": 3}}}"#,
    );
    write(&dir, ArtifactKind::TrainingStatus, &status(2));

    let verdict = classify_run(&root, "valueless");
    assert_eq!(verdict.reward, Some(0.0));
    assert_eq!(verdict.reward_provenance, Some(Provenance::Defaulted));
    assert_eq!(verdict.failures, vec![FailureReason::NonPositiveReward(0.0)]);
    assert!(verdict.warnings.contains(&HealthWarning::LowConfidence(
        "reward value missing, assumed 0.0".to_string()
    )));

    let value = serde_json::to_value(&verdict).unwrap();
    assert_eq!(value["reward_provenance"], serde_json::json!("defaulted"));
}

// ============================================================================
// Structural and parse failures
// ============================================================================

#[test]
fn test_run_without_run_logs() {
    let root = TempDir::new().unwrap();
    let dir = run_dir(&root, "config_only");
    write(&dir, ArtifactKind::Config, CONFIG);

    let verdict = classify_run(&root, "config_only");
    assert!(verdict.is_failed);
    assert_eq!(verdict.stage, CheckStage::Structural);
    assert_eq!(
        verdict.failures,
        vec![
            FailureReason::MissingArtifact(ArtifactKind::Timers),
            FailureReason::MissingArtifact(ArtifactKind::TrainingStatus),
        ]
    );
    assert_eq!(verdict.failures[0].to_string(), "missing timers.json");
}

#[test]
fn test_empty_run_directory_lists_all_missing_in_order() {
    let root = TempDir::new().unwrap();
    run_dir(&root, "empty");

    let verdict = classify_run(&root, "empty");
    let kinds: Vec<ArtifactKind> = verdict
        .failures
        .iter()
        .filter_map(FailureReason::artifact)
        .collect();
    assert_eq!(kinds, ArtifactKind::REQUIRED.to_vec());
}

#[test]
fn test_corrupted_timers_stops_before_metrics() {
    let root = TempDir::new().unwrap();
    let dir = run_dir(&root, "corrupt");
    write(&dir, ArtifactKind::Config, CONFIG);
    write(&dir, ArtifactKind::Timers, "{\"gauges\": {");
    write(&dir, ArtifactKind::TrainingStatus, &status(0));

    let verdict = classify_run(&root, "corrupt");
    assert_eq!(verdict.stage, CheckStage::Parse);
    assert_eq!(verdict.failures.len(), 1);
    assert!(matches!(
        &verdict.failures[0],
        FailureReason::Corrupted { kind: ArtifactKind::Timers, message } if !message.is_empty()
    ));
    assert!(verdict.failures[0].to_string().starts_with("corrupted timers.json: "));
}

#[test]
fn test_every_listed_run_gets_a_verdict() {
    let root = TempDir::new().unwrap();
    complete_run(&root, "a_ok", CONFIG, 3.0, 60, 2);
    run_dir(&root, "b_empty");
    let dir = run_dir(&root, "c_corrupt");
    write(&dir, ArtifactKind::Config, "behaviors: [");
    fs::write(root.path().join("stray_file.txt"), "not a run").unwrap();

    let store = ArtifactStore::new(root.path());
    let verdicts: Vec<_> = store
        .list_runs(RunOrdering::Name)
        .into_iter()
        .map(|artifacts| classify(&ParsedRun::load(artifacts), &HealthThresholds::default()))
        .collect();

    let ids: Vec<&str> = verdicts.iter().map(|v| v.run_id.as_str()).collect();
    assert_eq!(ids, vec!["a_ok", "b_empty", "c_corrupt"]);
    assert!(!verdicts[0].is_failed);
    assert!(verdicts[1].is_failed);
    assert!(verdicts[2].is_failed);
}
