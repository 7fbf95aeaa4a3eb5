//! End-to-end scans over fixture results directories

use runlens::compare::{compare, training_curves, ComparisonMetric};
use runlens::config::ScanOptions;
use runlens::health::FailureReason;
use runlens::scan::{CancellationToken, Scanner};
use runlens::store::ArtifactKind;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Create a complete run started at `start` (unix seconds).
fn healthy_run(root: &Path, run_id: &str, start: u64, reward: f64) {
    let dir = root.join(run_id);
    write(
        &ArtifactKind::Config.path_in(&dir),
        "behaviors:\n  Foo:\n    trainer_type: ppo\n    hyperparameters:\n      batch_size: 1024\n",
    );
    write(
        &ArtifactKind::Timers.path_in(&dir),
        &format!(
            r#"{{"gauges": {{
                    "Foo.Environment.CumulativeReward.mean": {{"value": {reward}, "max": {reward}}},
                    "Foo.Environment.EpisodeLength.mean": {{"value": 250.0}},
                    "Foo.Step.sum": {{"value": 50000.0}}
                }},
                "metadata": {{"start_time_seconds": {start}, "end_time_seconds": {end}}}}}"#,
            end = start + 600
        ),
    );
    write(
        &ArtifactKind::TrainingStatus.path_in(&dir),
        r#"{"Foo": {"checkpoints": [
            {"steps": 10000, "reward": 0.5, "creation_time": 1700000100},
            {"steps": 20000, "reward": 1.5, "creation_time": 1700000200},
            {"steps": 30000, "creation_time": 1700000300}
        ]}}"#,
    );
}

fn options(root: &Path) -> ScanOptions {
    ScanOptions::builder()
        .results_dir(root)
        .workers(2)
        .small_run_bytes(0)
        .build()
        .unwrap()
}

#[test]
fn test_scan_partitions_runs() {
    let root = TempDir::new().unwrap();
    healthy_run(root.path(), "run_a", 1_700_000_000, 4.2);
    healthy_run(root.path(), "run_b", 1_700_100_000, 6.0);
    write(&ArtifactKind::Config.path_in(&root.path().join("no_logs")), "behaviors:\n  Foo: {}\n");
    fs::create_dir_all(root.path().join("empty_run")).unwrap();

    let report = Scanner::new(options(root.path()))
        .scan(&CancellationToken::new())
        .unwrap();

    assert_eq!(report.runs_found, 4);
    assert!(!report.cancelled);
    let ids: Vec<&str> = report.runs.iter().map(|r| r.run_id()).collect();
    assert_eq!(ids, vec!["empty_run", "no_logs", "run_a", "run_b"]);

    let healthy: Vec<&str> = report.healthy().map(|r| r.run_id()).collect();
    assert_eq!(healthy, vec!["run_a", "run_b"]);
    assert!(report.wasted_bytes() > 0);

    let no_logs = report.runs.iter().find(|r| r.run_id() == "no_logs").unwrap();
    assert_eq!(
        no_logs.verdict.failures,
        vec![
            FailureReason::MissingArtifact(ArtifactKind::Timers),
            FailureReason::MissingArtifact(ArtifactKind::TrainingStatus),
        ]
    );

    let groups = report.failures_by_reason();
    assert_eq!(groups["missing configuration.yaml"].len(), 1);
    assert_eq!(groups["missing timers.json"].len(), 1);
}

#[test]
fn test_cancelled_scan_reports_nothing_unstarted() {
    let root = TempDir::new().unwrap();
    healthy_run(root.path(), "run_a", 1_700_000_000, 1.0);
    healthy_run(root.path(), "run_b", 1_700_000_000, 1.0);

    let token = CancellationToken::new();
    token.cancel();
    let report = Scanner::new(options(root.path())).scan(&token).unwrap();

    assert!(report.cancelled);
    assert_eq!(report.runs_found, 2);
    assert!(report.runs.is_empty());
}

#[test]
fn test_comparison_from_scan() {
    let root = TempDir::new().unwrap();
    healthy_run(root.path(), "older", 1_700_000_000, 2.0);
    healthy_run(root.path(), "newer", 1_700_500_000, 3.0);
    fs::create_dir_all(root.path().join("broken")).unwrap();

    let report = Scanner::new(options(root.path()))
        .scan(&CancellationToken::new())
        .unwrap();
    let overviews = report.overviews();
    let comparison = compare(&overviews);

    let order: Vec<&str> = comparison.runs.iter().map(|s| s.run_id.as_str()).collect();
    assert_eq!(order, vec!["newer", "older", "broken"]);
    assert_eq!(comparison.runs[0].duration_minutes, Some(10.0));
    assert_eq!(comparison.runs[0].steps, Some(50_000.0));

    let rewards = &comparison.metrics[&ComparisonMetric::CumulativeRewards];
    let xs: Vec<&str> = rewards.iter().map(|p| p.x.as_str()).collect();
    assert_eq!(xs, vec!["newer", "older"]);

    let curves = training_curves(&overviews, 10);
    let curve = curves.iter().find(|c| c.run_id == "newer").unwrap();
    assert_eq!(curve.steps, vec![10_000, 20_000]);
    assert_eq!(curve.rewards, vec![0.5, 1.5]);
    assert!(curves.iter().all(|c| c.run_id != "broken"));
}

#[test]
fn test_scan_single_run_with_toml_options() {
    let root = TempDir::new().unwrap();
    healthy_run(root.path(), "run_a", 1_700_000_000, 1.0);

    let options_path = root.path().join("runlens.toml");
    fs::write(
        &options_path,
        format!(
            "results_dir = \"{}\"\nworkers = 1\nmin_duration_seconds = 3600.0\n",
            root.path().display()
        ),
    )
    .unwrap();
    let options = ScanOptions::load(&options_path).unwrap();
    assert_eq!(options.workers, 1);

    let report = Scanner::new(options).scan_run("run_a").unwrap();
    assert!(report.verdict.is_failed);
    assert_eq!(report.verdict.failures, vec![FailureReason::CrashedImmediately(600.0)]);
}
