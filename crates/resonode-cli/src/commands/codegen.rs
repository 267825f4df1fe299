//! Web Audio code generation command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use resonode_codegen::CodeGenerator;

use super::common::{load_document, load_settings};

#[derive(Args)]
pub struct CodegenArgs {
    /// Document file, saved document name, or factory name
    document: String,

    /// Output file (prints to stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file (defaults to the user settings)
    #[arg(long)]
    settings: Option<PathBuf>,
}

pub fn run(args: CodegenArgs) -> anyhow::Result<()> {
    let document = load_document(&args.document)?;
    let settings = load_settings(args.settings.as_deref())?;

    let script = CodeGenerator::new()
        .with_master_gain(settings.output.master_gain)
        .with_noise_seconds(settings.noise.buffer_seconds)
        .generate(&document)
        .with_context(|| format!("could not generate code for '{}'", args.document))?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &script)
                .with_context(|| format!("could not write '{}'", path.display()))?;
            tracing::info!("codegen_write: {} bytes to {}", script.len(), path.display());
        }
        None => print!("{script}"),
    }
    Ok(())
}
