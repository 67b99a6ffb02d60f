mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use festgen_core::config::HwpStrategy;

#[derive(Parser)]
#[command(
    name = "festgen",
    version,
    about = "Summarize festival planning documents (PDF, DOCX, HWP) into structured records"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the environment configuration.
#[derive(clap::Args, Clone, Default)]
pub struct Overrides {
    /// Generation model (default: OPENAI_MODEL or gpt-3.5-turbo)
    #[arg(long)]
    pub model: Option<String>,

    /// Characters of document text sent for summarization
    #[arg(long, value_name = "CHARS")]
    pub budget: Option<usize>,

    /// HWP backend: offline (default) or remote
    #[arg(long, value_name = "STRATEGY")]
    pub hwp_strategy: Option<HwpStrategy>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a planning document into the festival schema
    Summarize {
        /// Path to a .pdf, .docx or .hwp file
        input_file: PathBuf,

        #[command(flatten)]
        overrides: Overrides,

        /// Planning theme; wraps the summary in an analysis report
        #[arg(long)]
        theme: Option<String>,

        /// Festival title as entered by the planner (report only)
        #[arg(long)]
        title: Option<String>,

        /// Comma-separated planning keywords (report only)
        #[arg(long, value_name = "LIST")]
        keywords: Option<String>,

        /// Output format: json (default) or table
        #[arg(short, long, default_value = "json")]
        output: String,

        /// Write the JSON record to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Print the extracted plain text of a document (no summarization)
    Extract {
        input_file: PathBuf,

        /// HWP backend: offline (default) or remote
        #[arg(long, value_name = "STRATEGY")]
        hwp_strategy: Option<HwpStrategy>,
    },
    /// Summarize several documents; one record per file
    Batch {
        #[arg(required = true)]
        input_files: Vec<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,

        /// Documents processed concurrently
        #[arg(short, long, default_value_t = 4)]
        jobs: usize,

        /// Write the JSON array to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Generate six Instagram card-news pages from a saved summary
    Cardnews {
        /// JSON file written by `festgen summarize -O`
        summary_file: PathBuf,

        /// Planning theme, e.g. "2030 연인들을 위한 로맨틱한 크리스마스 축제"
        #[arg(long)]
        theme: String,

        /// Trending search keyword (repeatable)
        #[arg(long = "trend", value_name = "KEYWORD")]
        trends: Vec<String>,

        /// Social buzzword (repeatable)
        #[arg(long = "buzzword", value_name = "WORD")]
        buzzwords: Vec<String>,

        /// Generation model (default: OPENAI_MODEL or gpt-3.5-turbo)
        #[arg(long)]
        model: Option<String>,
    },
    /// Print the extraction fields with their descriptions
    Schema,
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("festgen=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Summarize {
            input_file,
            overrides,
            theme,
            title,
            keywords,
            output,
            out,
        } => match commands::summarize::run(
            input_file,
            &overrides,
            commands::summarize::ReportArgs {
                theme,
                title,
                keywords,
            },
            &output,
            out,
        ) {
            // The error record is already on stdout.
            Ok(false) => std::process::exit(1),
            other => other.map(|_| ()),
        },
        Commands::Extract {
            input_file,
            hwp_strategy,
        } => commands::extract::run(input_file, hwp_strategy),
        Commands::Batch {
            input_files,
            overrides,
            jobs,
            out,
        } => commands::batch::run(input_files, &overrides, jobs, out),
        Commands::Cardnews {
            summary_file,
            theme,
            trends,
            buzzwords,
            model,
        } => commands::cardnews::run(summary_file, &theme, trends, buzzwords, model),
        Commands::Schema => commands::schema::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
