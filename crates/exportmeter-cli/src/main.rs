//! exportmeter CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "exportmeter", version, about = "Export readiness scoring service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a batch of answers and persist the result
    Submit {
        /// Form to submit against (defaults to `default_form` from config)
        #[arg(long)]
        form: Option<String>,

        /// Path to a TOML or JSON answers file
        #[arg(long)]
        answers: PathBuf,

        /// User id to attribute the submission to
        #[arg(long)]
        user: String,

        /// Output directory for artifacts (defaults to `output_dir` from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json, html, all
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the stored thermometer state for a user and form
    Status {
        /// Form to query (defaults to `default_form` from config)
        #[arg(long)]
        form: Option<String>,

        /// User id
        #[arg(long)]
        user: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List all stored scores for a user
    Results {
        /// User id
        #[arg(long)]
        user: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the active forms
    Forms {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate form definition TOML files
    Validate {
        /// Path to a form file or directory
        #[arg(long)]
        forms: PathBuf,
    },

    /// Compare two submission receipts
    Compare {
        /// Baseline receipt JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current receipt JSON
        #[arg(long)]
        current: PathBuf,

        /// Exit code 1 if any question regressed
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config, example form, and example answers
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("exportmeter=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Submit {
            form,
            answers,
            user,
            output,
            format,
            config,
        } => commands::submit::execute(form, answers, user, output, format, config).await,
        Commands::Status { form, user, config } => {
            commands::status::execute(form, user, config).await
        }
        Commands::Results { user, config } => commands::results::execute(user, config).await,
        Commands::Forms { config } => commands::forms::execute(config).await,
        Commands::Validate { forms } => commands::validate::execute(forms),
        Commands::Compare {
            baseline,
            current,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
