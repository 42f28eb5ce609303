//! Parallel analysis of many scenarios.
//!
//! Every scenario is parsed, aggregated and compared by its own worker; run
//! records are never shared, and outcomes are collected in input order.

use std::fmt;

use rayon::prelude::*;
use serde::Serialize;

use super::aggregate::aggregate;
use super::compare::compare_with_params;
use super::params::ScenarioParams;
use super::patterns::PatternGroups;
use super::transcript_parser::{ParseError, TranscriptParser};
use super::types::*;

/// Which run of a scenario a transcript belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunSide {
    Treatment,
    Baseline,
}

impl fmt::Display for RunSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSide::Treatment => write!(f, "treatment"),
            RunSide::Baseline => write!(f, "baseline"),
        }
    }
}

/// Errors that abort a single scenario
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("scenario {scenario:?}: {side} transcript: {source}")]
    Transcript {
        scenario: String,
        side: RunSide,
        #[source]
        source: ParseError,
    },
}

/// Raw input of one scenario: its transcripts and parameters
#[derive(Debug, Clone, Default)]
pub struct ScenarioInput {
    pub name: String,
    pub params: ScenarioParams,
    /// `None` when the treatment run produced no output
    pub treatment: Option<String>,
    /// `None` when the baseline run produced no output
    pub baseline: Option<String>,
}

/// Everything computed for one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioComparison {
    pub name: String,
    pub params: ScenarioParams,
    pub treatment_diagnostics: ParseDiagnostics,
    pub baseline_diagnostics: ParseDiagnostics,
    pub treatment: AggregatedSummary,
    pub baseline: AggregatedSummary,
    pub comparison: ComparisonTable,
    pub paths: PathTable,
}

pub type ScenarioOutcome = Result<ScenarioComparison, AnalysisError>;

/// Parse, aggregate and compare one scenario
pub fn analyze_scenario(input: &ScenarioInput, parser: &TranscriptParser) -> ScenarioOutcome {
    let parse = |side: RunSide, text: Option<&str>| {
        parser.parse(text).map_err(|source| AnalysisError::Transcript {
            scenario: input.name.clone(),
            side,
            source,
        })
    };

    let treatment = parse(RunSide::Treatment, input.treatment.as_deref())?;
    let baseline = parse(RunSide::Baseline, input.baseline.as_deref())?;

    let treatment_summary = aggregate(&treatment.record);
    let baseline_summary = aggregate(&baseline.record);
    let (comparison, paths) =
        compare_with_params(Some(&treatment_summary), Some(&baseline_summary), &input.params);

    log::debug!(
        "Scenario {}: {} comparison rows, {} paths",
        input.name,
        comparison.len(),
        paths.len()
    );

    Ok(ScenarioComparison {
        name: input.name.clone(),
        params: input.params.clone(),
        treatment_diagnostics: treatment.diagnostics,
        baseline_diagnostics: baseline.diagnostics,
        treatment: treatment_summary,
        baseline: baseline_summary,
        comparison,
        paths,
    })
}

/// Analyze all scenarios in parallel. A malformed transcript fails only its
/// own scenario.
pub fn analyze_scenarios(inputs: &[ScenarioInput], groups: PatternGroups) -> Vec<ScenarioOutcome> {
    log::info!("Analyzing {} scenarios in parallel...", inputs.len());

    let parser = TranscriptParser::new(groups);
    let outcomes: Vec<ScenarioOutcome> = inputs
        .par_iter()
        .map(|input| {
            let outcome = analyze_scenario(input, &parser);
            if let Err(e) = &outcome {
                log::warn!("{}", e);
            }
            outcome
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.is_err()).count();
    log::info!(
        "Analyzed {} scenarios ({} failed)",
        outcomes.len(),
        failed
    );

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::transcript_parser::Field;

    fn input(name: &str, treatment: &str, baseline: &str) -> ScenarioInput {
        ScenarioInput {
            name: name.to_string(),
            params: ScenarioParams::default(),
            treatment: Some(treatment.to_string()),
            baseline: Some(baseline.to_string()),
        }
    }

    #[test]
    fn test_outcomes_keep_input_order() {
        let inputs: Vec<ScenarioInput> = (1..=8)
            .map(|i| {
                input(
                    &format!("scenario-{}", i),
                    &format!("Throughput: {}.0 Mbps", i * 2),
                    &format!("Throughput: {}.0 Mbps", i),
                )
            })
            .collect();

        let outcomes = analyze_scenarios(&inputs, PatternGroups::ALL);
        assert_eq!(outcomes.len(), 8);
        for (i, outcome) in outcomes.iter().enumerate() {
            let result = outcome.as_ref().unwrap();
            assert_eq!(result.name, format!("scenario-{}", i + 1));
            let row = result.comparison.get(Metric::Throughput).unwrap();
            assert!((row.improvement_percent - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_malformed_transcript_fails_only_its_scenario() {
        let inputs = vec![
            input("good", "Throughput: 2.0 Mbps", "Throughput: 1.0 Mbps"),
            input("bad", "Throughput: 2.0 Mbps", "Packet loss: 1..2.3%"),
        ];
        let outcomes = analyze_scenarios(&inputs, PatternGroups::ALL);
        assert!(outcomes[0].is_ok());
        match &outcomes[1] {
            Err(AnalysisError::Transcript { scenario, side, source }) => {
                assert_eq!(scenario, "bad");
                assert_eq!(*side, RunSide::Baseline);
                let ParseError::MalformedNumber { field, line, .. } = source;
                assert_eq!(*field, Field::Loss);
                assert_eq!(*line, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_missing_transcripts_are_empty_observations() {
        let input = ScenarioInput {
            name: "nothing".to_string(),
            ..Default::default()
        };
        let result = analyze_scenario(&input, &TranscriptParser::default()).unwrap();
        assert!(result.treatment_diagnostics.no_metrics_recognized);
        assert!(result.baseline_diagnostics.no_metrics_recognized);
        assert!(result.comparison.get(Metric::Throughput).unwrap().improvement_percent.is_nan());
        assert!(result.paths.is_empty());
    }
}
