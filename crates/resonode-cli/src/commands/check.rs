//! Document validation command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use resonode_config::save_document;
use resonode_core::{AudioSystem, Connection, Evaluator, Graph, RecordingBackend, VoiceRegistry};

use super::common::{load_document, load_settings};

#[derive(Args)]
pub struct CheckArgs {
    /// Document file, saved document name, or factory name
    document: String,

    /// Write the cleaned-up document (dropped parts removed) to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file (defaults to the user settings)
    #[arg(long)]
    settings: Option<PathBuf>,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let document = load_document(&args.document)?;
    let settings = load_settings(args.settings.as_deref())?;

    let (graph, report) = Graph::from_document(&document);
    println!("Document: {}", args.document);
    println!(
        "  {} nodes, {} connections, {} comments",
        report.imported_nodes,
        report.imported_connections,
        graph.comments().len()
    );

    for (id, error) in &report.failed {
        println!("  dropped node {id}: {error}");
    }
    for (record, error) in &report.skipped {
        println!("  dropped wire {}: {error}", Connection::from(record.clone()));
    }

    let backend = RecordingBackend::new(f64::from(settings.backend.sample_rate));
    let mut system = AudioSystem::new(backend, settings.output.master_gain, settings.noise_config())
        .context("recording backend refused the master chain")?;
    let mut voices = VoiceRegistry::new();
    let build = Evaluator::new().build(&graph, &mut system, &mut voices);

    match &build {
        Ok(live) => {
            println!();
            println!("Build: {} nodes reachable from a sink", live.node_count());
            for (class, count) in live.counts() {
                println!("  {:20} {count}", class.name());
            }
            if !voices.is_empty() {
                println!("  {} keyboard voices", voices.voice_count());
            }
        }
        Err(e) => println!("\nBuild: {e}"),
    }

    if let Some(path) = &args.output {
        save_document(&graph.export_document(), path)?;
        println!("\nWrote {}", path.display());
    }

    if let Err(e) = build {
        anyhow::bail!("document does not build: {e}");
    }
    if !report.failed.is_empty() {
        anyhow::bail!("{} node(s) could not be imported", report.failed.len());
    }
    Ok(())
}
