//! Report generation for scenario comparisons.
//!
//! Renders comparison and path tables as fixed-width text, and writes a JSON
//! document with every scenario outcome.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use super::batch::{ScenarioComparison, ScenarioOutcome};
use super::types::*;

/// Column labels for the two runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RunLabels {
    pub treatment: String,
    pub baseline: String,
}

impl Default for RunLabels {
    fn default() -> Self {
        Self {
            treatment: "Treatment".to_string(),
            baseline: "Baseline".to_string(),
        }
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn format_improvement(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:+.1}%", value)
    }
}

/// Render a comparison table as fixed-width text
pub fn render_comparison_table(table: &ComparisonTable, labels: &RunLabels) -> String {
    let metric_width = table
        .iter()
        .map(|row| row.metric.to_string().len())
        .chain(std::iter::once("Metric".len()))
        .max()
        .unwrap_or(0);
    let t_width = labels.treatment.len().max(12);
    let b_width = labels.baseline.len().max(12);

    let mut lines = Vec::with_capacity(table.len() + 2);
    lines.push(format!(
        "{:<mw$}  {:>tw$}  {:>bw$}  {:>15}",
        "Metric",
        labels.treatment,
        labels.baseline,
        "Improvement (%)",
        mw = metric_width,
        tw = t_width,
        bw = b_width,
    ));
    lines.push("-".repeat(metric_width + t_width + b_width + 21));
    for row in table.iter() {
        lines.push(format!(
            "{:<mw$}  {:>tw$}  {:>bw$}  {:>15}",
            row.metric.to_string(),
            format_value(row.treatment_value),
            format_value(row.baseline_value),
            format_improvement(row.improvement_percent),
            mw = metric_width,
            tw = t_width,
            bw = b_width,
        ));
    }
    lines.join("\n")
}

/// Render a path table as fixed-width text
pub fn render_path_table(table: &PathTable) -> String {
    let mut lines = vec![
        format!("{:<10}  {:>15}  {:>10}", "Path", "Utilization (%)", "Weight (%)"),
        "-".repeat(39),
    ];
    for row in &table.rows {
        lines.push(format!(
            "{:<10}  {:>15.1}  {:>10.1}",
            row.path_label, row.utilization_percent, row.weight_percent
        ));
    }
    lines.join("\n")
}

/// Print one scenario's tables to stdout
pub fn print_scenario(result: &ScenarioComparison, labels: &RunLabels) {
    println!("{}", "=".repeat(80));
    println!("Scenario: {}", result.name);
    if !result.params.is_empty() {
        let params: Vec<String> = result
            .params
            .0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        println!("Parameters: {}", params.join(", "));
    }
    println!("{}", "=".repeat(80));
    println!("{}", render_comparison_table(&result.comparison, labels));
    if !result.paths.is_empty() {
        println!();
        println!("Path Utilization:");
        println!("{}", render_path_table(&result.paths));
    }
    println!();
}

/// Report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub analysis_timestamp: String,
    pub labels: RunLabels,
    pub total_scenarios: usize,
    pub failed_scenarios: usize,
}

/// A failed scenario as it appears in the report
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioFailure {
    pub error: String,
}

/// Serializable form of one outcome
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScenarioEntry<'a> {
    Analyzed(&'a ScenarioComparison),
    Failed(ScenarioFailure),
}

/// Full JSON report
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<'a> {
    pub metadata: ReportMetadata,
    pub scenarios: Vec<ScenarioEntry<'a>>,
}

impl<'a> BatchReport<'a> {
    pub fn new(outcomes: &'a [ScenarioOutcome], labels: &RunLabels) -> Self {
        let scenarios: Vec<ScenarioEntry<'a>> = outcomes
            .iter()
            .map(|outcome| match outcome {
                Ok(result) => ScenarioEntry::Analyzed(result),
                Err(e) => ScenarioEntry::Failed(ScenarioFailure {
                    error: e.to_string(),
                }),
            })
            .collect();
        let failed_scenarios = outcomes.iter().filter(|o| o.is_err()).count();

        Self {
            metadata: ReportMetadata {
                analysis_timestamp: chrono::Utc::now().to_rfc3339(),
                labels: labels.clone(),
                total_scenarios: outcomes.len(),
                failed_scenarios,
            },
            scenarios,
        }
    }
}

/// Generate JSON report
pub fn generate_json_report(report: &BatchReport<'_>, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ComparisonTable {
        ComparisonTable {
            rows: vec![
                ComparisonRow {
                    metric: Metric::Throughput,
                    treatment_value: 10.0,
                    baseline_value: 8.0,
                    improvement_percent: 25.0,
                },
                ComparisonRow {
                    metric: Metric::Jitter,
                    treatment_value: 0.01,
                    baseline_value: 0.0,
                    improvement_percent: f64::NAN,
                },
            ],
        }
    }

    #[test]
    fn test_render_comparison_table() {
        let text = render_comparison_table(&table(), &RunLabels::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Metric"));
        assert!(lines[2].contains("Throughput (Mbps)"));
        assert!(lines[2].ends_with("+25.0%"));
        assert!(lines[3].ends_with("n/a"));
    }

    #[test]
    fn test_render_path_table() {
        let paths = PathTable {
            rows: vec![PathRow {
                path_id: 1,
                path_label: "Path 1".to_string(),
                utilization_percent: 99.0,
                weight_percent: 75.0,
            }],
        };
        let text = render_path_table(&paths);
        assert!(text.lines().nth(2).unwrap().contains("99.0"));
    }

    #[test]
    fn test_json_report_round_trip_to_disk() {
        let outcomes: Vec<ScenarioOutcome> = Vec::new();
        let report = BatchReport::new(&outcomes, &RunLabels::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        generate_json_report(&report, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["metadata"]["total_scenarios"], 0);
        assert_eq!(json["metadata"]["labels"]["treatment"], "Treatment");
    }

    #[test]
    fn test_table_serializes_nan_as_null() {
        let json = serde_json::to_value(table()).unwrap();
        assert_eq!(json[0]["improvement_percent"], 25.0);
        assert!(json[1]["improvement_percent"].is_null());
    }
}
