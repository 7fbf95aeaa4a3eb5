//! Parallel scan of a results directory
//!
//! Each run is parsed and classified independently on a bounded rayon pool.
//! Results come back in listing order. Cancellation is checked once per run
//! before it starts; runs already finished stay in the report.

use crate::artifact::ParsedRun;
use crate::compare::RunOverview;
use crate::config::ScanOptions;
use crate::health::{classify, HealthThresholds, HealthVerdict};
use crate::store::{ArtifactStore, RunArtifactSet};
use crate::{Error, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared flag to stop a scan between runs.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create an untriggered token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Runs already in progress finish.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once [`CancellationToken::cancel`] was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Verdict and overview of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Health verdict
    pub verdict: HealthVerdict,
    /// Overview for comparison
    pub overview: RunOverview,
}

impl RunReport {
    /// Parse and classify one run.
    #[must_use]
    pub fn evaluate(artifacts: RunArtifactSet, thresholds: &HealthThresholds) -> Self {
        let parsed = ParsedRun::load(artifacts);
        let verdict = classify(&parsed, thresholds);
        let overview = RunOverview::from_parsed(&parsed);
        debug!(run_id = %verdict.run_id, failed = verdict.is_failed, "classified run");
        Self { verdict, overview }
    }

    /// Run identifier.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.verdict.run_id
    }
}

/// Outcome of a full scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    /// Reports in listing order
    pub runs: Vec<RunReport>,
    /// Run directories found before processing started
    pub runs_found: usize,
    /// True if the scan was cancelled before every run was processed
    pub cancelled: bool,
}

impl ScanReport {
    /// Runs classified healthy.
    pub fn healthy(&self) -> impl Iterator<Item = &RunReport> {
        self.runs.iter().filter(|r| !r.verdict.is_failed)
    }

    /// Runs classified failed.
    pub fn failed(&self) -> impl Iterator<Item = &RunReport> {
        self.runs.iter().filter(|r| r.verdict.is_failed)
    }

    /// Total bytes held by failed runs.
    #[must_use]
    pub fn wasted_bytes(&self) -> u64 {
        self.failed().map(|r| r.verdict.size_bytes).sum()
    }

    /// Failed runs grouped by their first failure reason, sorted by reason.
    #[must_use]
    pub fn failures_by_reason(&self) -> BTreeMap<String, Vec<&RunReport>> {
        let mut groups: BTreeMap<String, Vec<&RunReport>> = BTreeMap::new();
        for report in self.failed() {
            let key = report
                .verdict
                .primary_reason()
                .map_or_else(|| "unknown".to_string(), ToString::to_string);
            groups.entry(key).or_default().push(report);
        }
        groups
    }

    /// Overviews of every processed run, in listing order.
    #[must_use]
    pub fn overviews(&self) -> Vec<RunOverview> {
        self.runs.iter().map(|r| r.overview.clone()).collect()
    }
}

/// Scans a results directory with a bounded worker pool.
#[derive(Debug, Clone)]
pub struct Scanner {
    store: ArtifactStore,
    options: ScanOptions,
}

impl Scanner {
    /// Create a scanner over `options.results_dir`.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self {
            store: ArtifactStore::new(options.results_dir.clone()),
            options,
        }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Scan options in effect.
    #[must_use]
    pub const fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Parse and classify every run.
    ///
    /// A malformed run never aborts the scan; it is reported as failed.
    ///
    /// # Errors
    ///
    /// Returns error if the worker pool cannot be created.
    pub fn scan(&self, cancel: &CancellationToken) -> Result<ScanReport> {
        let runs = self.store.list_runs(self.options.order);
        let runs_found = runs.len();
        let thresholds = self.options.thresholds();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .thread_name(|i| format!("runlens-scan-{i}"))
            .build()
            .map_err(|e| Error::Other(format!("failed to build worker pool: {e}")))?;

        info!(
            root = %self.store.root().display(),
            runs = runs_found,
            workers = self.options.workers,
            "scanning runs"
        );

        let reports: Vec<RunReport> = pool.install(|| {
            runs.into_par_iter()
                .filter_map(|artifacts| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some(RunReport::evaluate(artifacts, &thresholds))
                })
                .collect()
        });

        let cancelled = reports.len() < runs_found;
        if cancelled {
            warn!(processed = reports.len(), runs = runs_found, "scan cancelled");
        }

        Ok(ScanReport { runs: reports, runs_found, cancelled })
    }

    /// Parse and classify one run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RunNotFound`] if no such run directory exists.
    pub fn scan_run(&self, run_id: &str) -> Result<RunReport> {
        let artifacts = self
            .store
            .run(run_id)
            .ok_or_else(|| Error::RunNotFound(run_id.to_string()))?;
        Ok(RunReport::evaluate(artifacts, &self.options.thresholds()))
    }
}
