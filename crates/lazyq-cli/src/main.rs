//! lazyq CLI: run, validate and explain YAML query pipelines.

use clap::{Parser, Subcommand};
use lazyq_core::QueryConfig;
use lazyq_pipeline::{execute, explain, parse_yaml_pipeline, validate, PipelineConfig};
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lazyq")]
#[command(about = "Lazy, deferred-execution queries over values, text and files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline and print its output as JSON
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// File fed to a `stdin` source instead of standard input
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Seed for `randomize` steps (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Pretty-print the JSON output (overrides config)
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a pipeline YAML file (syntax and lambdas)
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the step chain of a pipeline
    Explain {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pipeline,
            input,
            seed,
            pretty,
        } => match run_pipeline(&pipeline, input, seed, pretty) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Validate { pipeline } => {
            if let Err(e) = validate_pipeline(&pipeline) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Pipeline is valid");
        }
        Commands::Explain { pipeline } => {
            if let Err(e) = explain_pipeline(&pipeline) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_pipeline(
    pipeline_path: &PathBuf,
    input: Option<PathBuf>,
    seed: Option<u64>,
    pretty: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let parsed = parse_yaml_pipeline(&yaml_content)?;

    let mut config = QueryConfig::from_env();
    apply_pipeline_config(&mut config, &parsed.config);
    apply_cli_overrides(&mut config, seed, pretty);

    let input_text = match input {
        Some(path) => Some(fs::read_to_string(path)?),
        None if parsed.reads_stdin() => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Some(buf)
        }
        None => None,
    };

    tracing::info!(pipeline = %pipeline_path.display(), "running pipeline");
    let value = execute(&parsed, &config, input_text.as_deref())?;
    Ok(value.to_json_string(config.json_pretty)?)
}

fn validate_pipeline(pipeline_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let parsed = parse_yaml_pipeline(&yaml_content)?;
    let mut config = QueryConfig::from_env();
    apply_pipeline_config(&mut config, &parsed.config);
    validate(&parsed, &config)?;
    Ok(())
}

fn explain_pipeline(pipeline_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let parsed = parse_yaml_pipeline(&yaml_content)?;
    print!("{}", explain(&parsed));
    Ok(())
}

fn apply_pipeline_config(cfg: &mut QueryConfig, doc: &PipelineConfig) {
    doc.apply_to(cfg);
}

fn apply_cli_overrides(cfg: &mut QueryConfig, seed: Option<u64>, pretty: bool) {
    if let Some(seed) = seed {
        cfg.seed = Some(seed);
    }
    if pretty {
        cfg.json_pretty = true;
    }
}
