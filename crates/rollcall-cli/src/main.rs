#![forbid(unsafe_code)]

mod cmd;
mod output;
mod source;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use rollcall_core::config::load_config;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "rollcall: roster, timesheet and incident reconciliation",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format (pretty, text, json).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Config file [default: ./rollcall.toml when present].
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags and environment.
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Analysis",
        about = "Reconcile all sheets and write the overview",
        long_about = "Merge roster, timesheet and incident exports into one set of people, pair \
                      check-ins into sessions, bucket time by shift and week, and write the \
                      overview CSV.",
        after_help = "EXAMPLES:\n    # Full run; writes hours_overview.csv beside the timesheet\n    rollcall analyze -t hours.csv -r roster.csv -i incidents.csv\n\n    # Keep the result for later queries\n    rollcall analyze -t hours.csv -r roster.csv --snapshot batch.json\n\n    # Emit machine-readable output\n    rollcall analyze -t hours.csv --no-csv --json"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Show one person's sessions",
        long_about = "Show clocked time and every paired session for one person. Spelling \
                      variants of the name are matched the same way ingestion matches them.",
        after_help = "EXAMPLES:\n    # Sessions straight from the sheets\n    rollcall person \"Ann Lee\" -t hours.csv\n\n    # From a saved snapshot\n    rollcall person \"Ann Lee\" --from-snapshot batch.json --json"
    )]
    Person(cmd::person::PersonArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "List unpaired timesheet rows",
        long_about = "List timesheet rows that could not be paired into sessions: double \
                      check-ins (crash), check-outs before any check-in (pre), sessions still \
                      open at the end (post), and unknown actions (other).",
        after_help = "EXAMPLES:\n    # All anomalies\n    rollcall anomalies -t hours.csv\n\n    # Only double check-ins\n    rollcall anomalies -t hours.csv --kind crash"
    )]
    Anomalies(cmd::anomalies::AnomaliesArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    rollcall completions bash\n\n    # Generate zsh completions\n    rollcall completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ROLLCALL_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "rollcall=debug,info"
        } else {
            "rollcall=info,warn"
        })
    });

    let format = env::var("ROLLCALL_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command, &mut std::io::stdout());
    }

    let root = env::current_dir()?;
    let config = match load_config(cli.config.as_deref(), &root) {
        Ok(config) => config,
        Err(err) => {
            render_error(output, &CliError::config(&err))?;
            return Err(err);
        }
    };

    match &cli.command {
        Commands::Analyze(args) => cmd::analyze::run_analyze(args, &config, output),
        Commands::Person(args) => cmd::person::run_person(args, &config, output),
        Commands::Anomalies(args) => cmd::anomalies::run_anomalies(args, &config, output),
        Commands::Completions(_) => Ok(()),
    }
}
