//! SortBot - recycling robot simulation
//!
//! CLI entry point with global panic handler.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use sortbot::cli::{
    PlayCommand, PlayOptions, ResetCommand, ResetOptions, StatusCommand, StatusOptions,
};
use sortbot::config::{crash_log_path, Config};
use sortbot::error::exit_codes;
use sortbot::host::{Input, OracleInput, TerminalDisplay, TerminalInput};
use sortbot::storage::{FileSnapshotStore, SnapshotStore};

// =============================================================================
// CLI Definition
// =============================================================================

/// SortBot - teach a robot to sort recycling
#[derive(Parser)]
#[command(name = "sortbot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the robot (or reuse training) and run one sorting trial
    Play {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Label every training sample correctly without asking
        #[arg(long)]
        oracle: bool,
        /// Discard stored training and train again
        #[arg(long)]
        retrain: bool,
        /// Seed for a reproducible session
        #[arg(long)]
        seed: Option<u64>,
        /// Number of items in the trial
        #[arg(long)]
        batch_size: Option<u32>,
    },

    /// Show what the stored training would make the robot do
    Status {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Forget stored training
    Reset {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("sortbot error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, appends to `<home>/crash.log` and exits with the crash code.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("sortbot panic: {}", info);

        if let Some(crash_log) = crash_log_path() {
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = Config::load();
    let store: Arc<dyn SnapshotStore> = Arc::new(FileSnapshotStore::new()?);

    match cli.command {
        Commands::Play {
            json,
            quiet,
            oracle,
            retrain,
            seed,
            batch_size,
        } => {
            let options = PlayOptions {
                json,
                quiet,
                oracle,
                retrain,
                seed,
                batch_size,
            };
            run_play(store, config, &options)
        }
        Commands::Status { json, quiet } => {
            let options = StatusOptions { json, quiet };
            let cmd = StatusCommand::new(store, config);
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(to_exit_code(output.exit_code()))
        }
        Commands::Reset { json, quiet } => {
            let options = ResetOptions { json, quiet };
            let cmd = ResetCommand::new(store, config);
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(to_exit_code(output.exit_code()))
        }
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn run_play(
    store: Arc<dyn SnapshotStore>,
    config: Config,
    options: &PlayOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = PlayCommand::new(store, config);

    // Robot speech goes to stderr so stdout carries only the result.
    let mut display = TerminalDisplay::new(io::stderr(), options.json || options.quiet);
    let mut oracle_input = OracleInput::default();
    let mut terminal_input = TerminalInput::new(io::stdin().lock(), io::stderr());
    let input: &mut dyn Input = if options.oracle {
        &mut oracle_input
    } else {
        &mut terminal_input
    };

    let output = cmd.run(options, input, &mut display);
    print_output(&cmd.format_output(&output, options));
    Ok(to_exit_code(output.exit_code()))
}

fn print_output(text: &str) {
    if !text.is_empty() {
        print!("{}", text);
        if !text.ends_with('\n') {
            println!();
        }
    }
}

fn to_exit_code(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}
