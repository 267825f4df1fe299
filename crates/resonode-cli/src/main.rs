//! Resonode CLI - inspect, check, and compile node graph documents.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resonode")]
#[command(author, version, about = "Resonode node graph CLI", long_about = None)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List node kinds in the palette
    Kinds(commands::kinds::KindsArgs),

    /// Import a document and report what would be dropped
    Check(commands::check::CheckArgs),

    /// Generate a standalone Web Audio program from a document
    Codegen(commands::codegen::CodegenArgs),

    /// Run reconciliation and key presses against the recording backend
    Simulate(commands::simulate::SimulateArgs),

    /// List, show, and save documents
    Documents(commands::documents::DocumentsArgs),

    /// Show or create the settings file
    Settings(commands::settings::SettingsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Kinds(args) => commands::kinds::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Codegen(args) => commands::codegen::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Documents(args) => commands::documents::run(args),
        Commands::Settings(args) => commands::settings::run(args),
    }
}
