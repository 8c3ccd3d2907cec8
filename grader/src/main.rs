use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::config::Config;
use common::logger::init_logger;
use grader::CompileOptions;
use pipeline::BoxRegistry;
use serde::Serialize;
use util::paths::WorkingDirs;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Environment file read before configuration is loaded
    #[arg(long, default_value = ".env")]
    env_file: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every test pipeline of an exercise
    Validate { exercise: PathBuf },
    /// Compile an exercise for one submission into a job
    Compile {
        exercise: PathBuf,
        /// Defaults to DEFAULT_HARDWARE_GROUP
        #[arg(long)]
        hardware_group: Option<String>,
        #[arg(long)]
        environment: Option<String>,
        /// Submitted file names
        #[arg(long, num_args = 1..)]
        submission: Vec<String>,
        #[arg(long)]
        job_id: Option<String>,
        /// Write the job here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Score a worker's results report
    Evaluate {
        job: PathBuf,
        results: PathBuf,
        /// Score configuration; equal test weights when omitted
        #[arg(long)]
        score: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn emit<T: Serialize>(value: &T, out: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    match out {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Saved to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::init(&args.env_file);
    init_logger(&config.log_level, &config.log_file, config.log_to_stdout)
        .context("initialising logger")?;

    let registry = BoxRegistry::standard();
    match args.command {
        Command::Validate { exercise } => {
            let tests = grader::validate_exercise(&exercise, &registry)?;
            tracing::info!(tests = tests.len(), "exercise is valid");
            println!("{} is valid ({} tests)", exercise.display(), tests.len());
        }
        Command::Compile {
            exercise,
            hardware_group,
            environment,
            submission,
            job_id,
            out,
        } => {
            let options = CompileOptions {
                hardware_group: hardware_group
                    .unwrap_or_else(|| config.default_hardware_group.clone()),
                environment,
                submission,
                job_id,
                working_dirs: WorkingDirs::from_config(config),
            };
            let job = grader::compile(&exercise, options, &registry)?;
            emit(&job, out)?;
        }
        Command::Evaluate {
            job,
            results,
            score,
            out,
        } => {
            let response = grader::evaluate(&job, &results, score.as_deref())?;
            emit(&response, out)?;
        }
    }
    Ok(())
}
