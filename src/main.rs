// ==============================================================================
// main.rs - BioAssay Command Line Entry Point
// ==============================================================================
// Description: Convert, filter and inspect microarray BioAssay files
// Created: 2025-11-15
// Modified: 2026-01-17
// Version: 2.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bioassay_kit::filters::{create_threshold_filter, BioAssayFilter};
use bioassay_kit::formats::{ReaderFormat, WriterFormat};
use bioassay_kit::output::{self, WriteOptions};
use bioassay_kit::parsers::{self, ReadOptions};
use bioassay_kit::processor::{self, collect_inputs, Job, JobProcessor};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Reader options shared by the subcommands
#[derive(Args, Debug)]
struct InputArgs {
    /// Input format (gpr, gal, idma, total.summary, universal)
    #[arg(short = 't', long, env = "BIOASSAY_INPUT_TYPE", default_value = "universal")]
    input_type: ReaderFormat,

    /// Read every column instead of the format's default fields
    #[arg(long, env = "BIOASSAY_ALL_FIELDS")]
    all_fields: bool,

    /// Numbers use ',' as decimal separator
    #[arg(long, env = "BIOASSAY_COMMA_DECIMAL")]
    comma: bool,
}

impl InputArgs {
    fn read_options(&self) -> ReadOptions {
        ReadOptions {
            all_fields: self.all_fields,
            comma_decimal: self.comma,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert files (or directories of files) to another format
    Convert {
        /// Input files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        input: InputArgs,

        /// Output format (gpr, gal, idma, soft, total.summary, total.summary.xsl)
        #[arg(short = 'T', long, env = "BIOASSAY_OUTPUT_TYPE")]
        output_type: WriterFormat,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Annotation table appended to written rows
        #[arg(long)]
        translator: Option<PathBuf>,
    },

    /// Remove the rows where `field condition threshold` holds
    Filter {
        input_file: PathBuf,

        #[command(flatten)]
        input: InputArgs,

        /// Field to test (e.g. a, m, flags)
        #[arg(short, long)]
        field: String,

        /// Comparison: "<=" or ">="
        #[arg(short, long)]
        condition: String,

        #[arg(long, allow_hyphen_values = true)]
        threshold: f64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short = 'T', long, env = "BIOASSAY_OUTPUT_TYPE", default_value = "idma")]
        output_type: WriterFormat,
    },

    /// Print a JSON summary of each file
    Info {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Run a JSON job file
    Run { job_file: PathBuf },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bioassay_kit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Convert {
            inputs,
            input,
            output_type,
            output_dir,
            translator,
        } => {
            let job = Job {
                inputs,
                input_type: input.input_type,
                all_fields: input.all_fields,
                comma: input.comma,
                steps: Vec::new(),
                output_dir,
                output_type,
                write_all_fields: true,
                translator,
            };
            let written = JobProcessor::new(job).process()?;
            info!("Converted {} files", written.len());
        }

        Command::Filter {
            input_file,
            input,
            field,
            condition,
            threshold,
            output,
            output_type,
        } => {
            let filter = create_threshold_filter(field.as_str(), condition.as_str(), threshold)?;
            let bioassay = parsers::read_bioassay(&input_file, input.input_type, input.read_options())
                .with_context(|| format!("Failed to read {:?}", input_file))?;

            let filtered = filter.filter(&bioassay);
            info!(
                "Filter {} removed {} of {} rows",
                filter,
                bioassay.size() - filtered.size(),
                bioassay.size()
            );

            output::write_bioassay(&filtered, &output, output_type, WriteOptions { all_fields: true }, None)
                .with_context(|| format!("Failed to write {:?}", output))?;
        }

        Command::Info { inputs, input } => {
            let files = collect_inputs(&inputs, input.input_type)?;
            for file in files {
                let bioassay = parsers::read_bioassay(&file.path, input.input_type, input.read_options())
                    .with_context(|| format!("Failed to read {:?}", file.path))?;
                println!("{}", serde_json::to_string_pretty(&processor::summarize(&bioassay))?);
            }
        }

        Command::Run { job_file } => {
            let job = Job::from_file(&job_file)?;
            let written = JobProcessor::new(job).process()?;
            for path in written {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
