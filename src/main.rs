//! Comparative analysis CLI for congestion-control simulation transcripts.
//!
//! Compares a treatment run against a baseline run, either for one pair of
//! transcripts or for a batch of scenarios described in a YAML file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};
use env_logger::Env;

use nadastat::analysis::{
    self,
    batch::{RunSide, ScenarioInput},
    report::{self, BatchReport, RunLabels},
    Flavor, ScenarioParams, TranscriptParser,
};
use nadastat::config_loader;

#[derive(Parser)]
#[command(name = "nadastat")]
#[command(about = "Compare treatment and baseline congestion-control simulation runs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of parallel workers (0 = auto-detect)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare one treatment transcript against one baseline transcript
    Compare {
        /// Transcript of the treatment run
        #[arg(long)]
        treatment: PathBuf,

        /// Transcript of the baseline run
        #[arg(long)]
        baseline: PathBuf,

        /// Transcript flavor (single_path, multipath, tcp_wrapped, webrtc, all)
        #[arg(long, default_value = "all")]
        flavor: Flavor,

        /// Scenario parameter as key=value, may be repeated
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Column label of the treatment run
        #[arg(long, default_value = "Treatment")]
        treatment_label: String,

        /// Column label of the baseline run
        #[arg(long, default_value = "Baseline")]
        baseline_label: String,
    },

    /// Analyze every scenario of a YAML batch configuration
    Batch {
        /// Path to the batch configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Write a JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse one transcript and print its aggregated summary as JSON
    Inspect {
        /// Transcript to parse
        file: PathBuf,

        /// Transcript flavor
        #[arg(long, default_value = "all")]
        flavor: Flavor,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Compare {
            treatment,
            baseline,
            flavor,
            params,
            treatment_label,
            baseline_label,
        } => {
            let params = ScenarioParams::from_pairs(params.iter().map(String::as_str))
                .map_err(|e| eyre!(e))?;
            let input = ScenarioInput {
                name: scenario_name(&treatment, &baseline),
                params,
                treatment: read_required(&treatment, RunSide::Treatment)?,
                baseline: read_required(&baseline, RunSide::Baseline)?,
            };
            let labels = RunLabels {
                treatment: treatment_label,
                baseline: baseline_label,
            };

            let parser = TranscriptParser::new(flavor.groups());
            let result = analysis::batch::analyze_scenario(&input, &parser)?;
            report::print_scenario(&result, &labels);
        }
        Commands::Batch { config, output } => {
            run_batch(&config, output.as_deref())?;
        }
        Commands::Inspect { file, flavor } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read transcript {}", file.display()))?;
            let outcome = TranscriptParser::new(flavor.groups()).parse(Some(&text))?;
            let summary = analysis::aggregate(&outcome.record);

            let json = serde_json::json!({
                "diagnostics": outcome.diagnostics,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

fn run_batch(config_path: &Path, output: Option<&Path>) -> Result<()> {
    let config = config_loader::load_config(config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let inputs = config_loader::load_scenarios(&config, base_dir)?;

    let outcomes = analysis::analyze_scenarios(&inputs, config.flavor.groups());

    for outcome in &outcomes {
        match outcome {
            Ok(result) => report::print_scenario(result, &config.labels),
            Err(e) => println!("Scenario failed: {}\n", e),
        }
    }

    if let Some(path) = output {
        let report = BatchReport::new(&outcomes, &config.labels);
        report::generate_json_report(&report, path)?;
    }

    let failed = outcomes.iter().filter(|o| o.is_err()).count();
    log::info!(
        "Batch complete: {} scenarios, {} failed",
        outcomes.len(),
        failed
    );

    Ok(())
}

/// Read a transcript given on the command line; an empty file still counts
/// as an observation, a missing one is an error.
fn read_required(path: &Path, side: RunSide) -> Result<Option<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} transcript {}", side, path.display()))?;
    Ok(Some(text))
}

fn scenario_name(treatment: &Path, baseline: &Path) -> String {
    let stem = |p: &Path| {
        p.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| p.display().to_string())
    };
    format!("{} vs {}", stem(treatment), stem(baseline))
}
