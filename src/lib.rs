//! # nadastat - Comparative analysis of congestion-control simulation runs
//!
//! This library turns the free-form text transcripts printed by network
//! simulation runs into structured metrics, and compares a treatment run
//! (typically multipath NADA) against a baseline run of the same scenario.
//!
//! ## Overview
//!
//! Each run prints throughput, delay, loss and jitter samples, plus optional
//! per-path, buffer, TCP, frame and protocol statistics. A run is parsed into
//! a [`analysis::RunRecord`], reduced to an [`analysis::AggregatedSummary`],
//! and two summaries are compared into a [`analysis::ComparisonTable`] of
//! improvement percentages and a [`analysis::PathTable`] of per-path
//! utilization.
//!
//! ## Architecture
//!
//! - `analysis::patterns`: line recognizers and flavor-specific pattern groups
//! - `analysis::transcript_parser`: line-oriented transcript parser
//! - `analysis::aggregate`: reduction of sample sequences to scalars
//! - `analysis::compare`: derived metrics and comparison tables
//! - `analysis::batch`: parallel analysis of many scenarios
//! - `analysis::report`: text tables and JSON reports
//! - `config`, `config_loader`: YAML batch configuration
//! - `utils`: numeric helpers
//!
//! ## Example Usage
//!
//! ```rust
//! use nadastat::analysis::{aggregate, compare, parse_transcript, Metric};
//!
//! let treatment = parse_transcript(Some("Throughput: 10.0 Mbps\nMean delay: 0.040 seconds"))?;
//! let baseline = parse_transcript(Some("Throughput: 8.0 Mbps\nMean delay: 0.050 seconds"))?;
//!
//! let (table, _paths) = compare(
//!     Some(&aggregate(&treatment.record)),
//!     Some(&aggregate(&baseline.record)),
//! );
//! let throughput = table.get(Metric::Throughput).unwrap();
//! assert!((throughput.improvement_percent - 25.0).abs() < 1e-9);
//! # Ok::<(), nadastat::analysis::ParseError>(())
//! ```
//!
//! ## Error Handling
//!
//! Library errors are `thiserror` enums. A malformed number in a recognized
//! line is a `ParseError` and fails only the scenario it belongs to. Loading
//! and reporting code returns `color_eyre` results with context.

pub mod analysis;
pub mod config;
pub mod config_loader;
pub mod utils;
