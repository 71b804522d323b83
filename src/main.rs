//! Dropout Risk - command line entry point
//!
//! Usage:
//!   dropout-risk predict student.json
//!   dropout-risk explain - < student.json
//!   dropout-risk batch students.json
//!   dropout-risk status --warm-up

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use dropout_risk_core::api::commands;
use dropout_risk_core::constants::{APP_NAME, APP_VERSION};
use dropout_risk_core::logic::{pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "dropout-risk", version, about = "Student dropout risk prediction")]
struct Cli {
    /// Directory holding classifier.onnx, scaler.json and background.json.
    /// Overrides the DROPOUT_*_PATH variables.
    #[arg(long, global = true)]
    artifact_dir: Option<PathBuf>,

    /// Coalitions sampled per explanation
    #[arg(long, global = true)]
    nsamples: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict one student (JSON object; "-" reads stdin)
    Predict { input: PathBuf },
    /// Predict and explain one student
    Explain { input: PathBuf },
    /// Predict a JSON array of students
    Batch { input: PathBuf },
    /// Show engine status
    Status {
        /// Load all artifacts first
        #[arg(long)]
        warm_up: bool,
    },
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let mut content = String::new();
    if path.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut content)
            .context("failed to read stdin")?;
    } else {
        content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
    }
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn print(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let mut config = PipelineConfig::from_env();
    if let Some(dir) = &cli.artifact_dir {
        config = config.with_artifact_dir(dir);
    }
    if let Some(n) = cli.nsamples {
        config.nsamples = n;
    }
    let pipeline = pipeline::init(config);

    match &cli.command {
        Command::Predict { input } => {
            let response = commands::predict_student(pipeline, read_json(input)?)?;
            print(&response)
        }
        Command::Explain { input } => {
            let response = commands::predict_with_explanation(pipeline, read_json(input)?)?;
            print(&response)
        }
        Command::Batch { input } => {
            let report = commands::predict_batch(pipeline, read_json(input)?)?;
            print(&report)
        }
        Command::Status { warm_up } => {
            if *warm_up {
                if let Err(e) = pipeline.warm_up() {
                    log::warn!("Warm-up incomplete: {}", e);
                }
            }
            print(&commands::get_engine_status(pipeline))
        }
    }
}
