//! # runlens: Telemetry Reconciliation for Training Runs
//!
//! runlens reads the artifact directories that ML-Agents style trainers leave
//! behind, reconciles their heterogeneous telemetry into step-aligned series,
//! and classifies every run as healthy or failed with stated reasons.
//!
//! ## Design Principles
//!
//! - **Absence is data**: a missing file or metric is reported, never zero-filled
//! - **Provenance**: every inferred value says whether it was observed, derived,
//!   guessed or defaulted
//! - **Isolation**: one malformed run never aborts a scan
//! - **Determinism**: the same directory always yields the same verdicts
//!
//! ## Pipeline
//!
//! ```text
//! ArtifactStore ──► ParsedRun ──► HealthClassifier ──► HealthVerdict
//!                       │
//!                       ├──► RunOverview ──► ComparisonAggregator
//!                       │
//! scalars.json ──► SeriesReconciler ──► CombinedSeries ──► Downsampler
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use runlens::config::ScanOptions;
//! use runlens::scan::{CancellationToken, Scanner};
//!
//! let options = ScanOptions::builder().results_dir("results").workers(4).build()?;
//! let report = Scanner::new(options).scan(&CancellationToken::new())?;
//!
//! for run in report.failed() {
//!     println!("{}: {}", run.run_id(), run.verdict.summary());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod artifact;
pub mod compare;
pub mod config;
pub mod downsample;
pub mod error;
pub mod health;
pub mod reconcile;
pub mod scan;
pub mod schema;
pub mod series;
pub mod store;

pub use error::{Error, Result};
