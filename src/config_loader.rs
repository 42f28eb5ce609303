use crate::analysis::batch::{RunSide, ScenarioInput};
use crate::config::Config;
use color_eyre::eyre::{Context, Result};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .with_context(|| format!("Failed to open configuration {}", config_path.display()))?;

    let config: Config = serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to parse configuration {}", config_path.display()))?;

    config.validate()?;

    info!(
        "Loaded {} scenarios (flavor: {})",
        config.scenarios.len(),
        config.flavor
    );

    Ok(config)
}

/// Read the transcripts of every scenario. Relative paths are resolved
/// against `base_dir`; a missing file becomes an empty observation.
pub fn load_scenarios(config: &Config, base_dir: &Path) -> Result<Vec<ScenarioInput>> {
    config
        .scenarios
        .iter()
        .map(|scenario| -> Result<ScenarioInput> {
            let read = |side: RunSide, path: Option<&Path>| -> Result<Option<String>> {
                match path {
                    Some(path) => read_transcript(&base_dir.join(path), &scenario.name, side),
                    None => {
                        warn!("Scenario {}: no {} transcript configured", scenario.name, side);
                        Ok(None)
                    }
                }
            };

            Ok(ScenarioInput {
                name: scenario.name.clone(),
                params: scenario.params.clone(),
                treatment: read(RunSide::Treatment, scenario.treatment.as_deref())?,
                baseline: read(RunSide::Baseline, scenario.baseline.as_deref())?,
            })
        })
        .collect()
}

/// Read one transcript file. `Ok(None)` if the file does not exist.
pub fn read_transcript(path: &Path, scenario: &str, side: RunSide) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => {
            debug!("Read {} bytes from {}", text.len(), path.display());
            Ok(Some(text))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(
                "Scenario {}: {} transcript {} not found, treating as empty",
                scenario,
                side,
                path.display()
            );
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read transcript {}", path.display())),
    }
}
