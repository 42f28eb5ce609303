//! Transcript analysis for multipath and single-path congestion-control runs.
//!
//! Transcripts are parsed into run records, reduced to aggregated summaries,
//! and compared treatment-versus-baseline into comparison and path tables.

pub mod types;
pub mod patterns;
pub mod transcript_parser;
pub mod aggregate;
pub mod params;
pub mod compare;
pub mod batch;
pub mod report;

pub use types::*;
pub use patterns::{Flavor, PatternGroups};
pub use transcript_parser::{parse_transcript, ParseError, TranscriptParser};
pub use aggregate::aggregate;
pub use params::ScenarioParams;
pub use compare::{compare, compare_with_params, path_table};
pub use batch::{analyze_scenarios, AnalysisError, ScenarioInput, ScenarioOutcome};
pub use report::{generate_json_report, render_comparison_table, render_path_table, RunLabels};
