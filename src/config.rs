//! Batch configuration: which transcripts to compare, under which flavor.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analysis::params::ScenarioParams;
use crate::analysis::patterns::Flavor;
use crate::analysis::report::RunLabels;

/// Parameters that must be positive numbers when present
const SIZE_PARAMS: [&str; 2] = ["packetSize", "frameSize"];

/// Top-level batch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub flavor: Flavor,
    #[serde(default)]
    pub labels: RunLabels,
    pub scenarios: Vec<ScenarioConfig>,
}

/// One scenario: a name, its parameters and the two transcript files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub params: ScenarioParams,
    /// Transcript of the treatment run; absent means no output was captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<PathBuf>,
    /// Transcript of the baseline run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<PathBuf>,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.labels.treatment.trim().is_empty() || self.labels.baseline.trim().is_empty() {
            return Err(ValidationError::InvalidLabels(
                "treatment and baseline labels cannot be empty".to_string(),
            ));
        }

        if self.scenarios.is_empty() {
            return Err(ValidationError::InvalidScenario(
                "at least one scenario is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if scenario.name.trim().is_empty() {
                return Err(ValidationError::InvalidScenario(
                    "scenario name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(scenario.name.as_str()) {
                return Err(ValidationError::InvalidScenario(format!(
                    "duplicate scenario name: {}",
                    scenario.name
                )));
            }
            Self::validate_params(&scenario.name, &scenario.params)?;
        }

        Ok(())
    }

    fn validate_params(name: &str, params: &ScenarioParams) -> Result<(), ValidationError> {
        for key in SIZE_PARAMS {
            let Some(value) = params.get(key) else {
                continue;
            };
            match value.as_f64() {
                Some(v) if v > 0.0 => {}
                _ => {
                    return Err(ValidationError::InvalidParameter(format!(
                        "{} in scenario {} must be a positive number, got {}",
                        key, name, value
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid scenario configuration: {0}")]
    InvalidScenario(String),
    #[error("Invalid labels: {0}")]
    InvalidLabels(String),
    #[error("Invalid scenario parameter: {0}")]
    InvalidParameter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = parse("scenarios:\n  - name: Standard\n");
        assert_eq!(config.flavor, Flavor::All);
        assert_eq!(config.labels, RunLabels::default());
        assert!(config.scenarios[0].treatment.is_none());
        assert!(config.scenarios[0].params.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
flavor: multipath
labels:
  treatment: Multipath-NADA
scenarios:
  - name: Standard
    params: { dataRate: 10Mbps, delayMs: 50, packetSize: 1000 }
    treatment: runs/standard/multipath.txt
    baseline: runs/standard/simple.txt
"#,
        );
        assert_eq!(config.flavor, Flavor::Multipath);
        assert_eq!(config.labels.treatment, "Multipath-NADA");
        assert_eq!(config.labels.baseline, "Baseline");
        assert_eq!(
            config.scenarios[0].treatment.as_deref(),
            Some(std::path::Path::new("runs/standard/multipath.txt"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let empty = parse("scenarios: []\n");
        assert!(matches!(empty.validate(), Err(ValidationError::InvalidScenario(_))));

        let duplicate = parse("scenarios:\n  - name: A\n  - name: A\n");
        assert!(matches!(duplicate.validate(), Err(ValidationError::InvalidScenario(_))));

        let unnamed = parse("scenarios:\n  - name: \"\"\n");
        assert!(matches!(unnamed.validate(), Err(ValidationError::InvalidScenario(_))));

        let labels = parse("labels: { treatment: \"\" }\nscenarios:\n  - name: A\n");
        assert!(matches!(labels.validate(), Err(ValidationError::InvalidLabels(_))));

        let packet = parse("scenarios:\n  - name: A\n    params: { packetSize: 0 }\n");
        assert!(matches!(packet.validate(), Err(ValidationError::InvalidParameter(_))));

        let frame = parse("scenarios:\n  - name: A\n    params: { frameSize: large }\n");
        assert!(matches!(frame.validate(), Err(ValidationError::InvalidParameter(_))));
    }
}
