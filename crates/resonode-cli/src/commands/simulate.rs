//! Runs a document through the live engine against the recording backend.
//!
//! Reconciliation passes take real time (a few hundred milliseconds each),
//! while the backend clock used for key envelopes is advanced by hand.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use resonode_core::{AudioBackend, KeyCode, RecordingBackend};
use resonode_engine::Session;

use super::common::{load_document, load_settings};

#[derive(Args)]
pub struct SimulateArgs {
    /// Document file, saved document name, or factory name
    document: String,

    /// Key codes to press in order (e.g. KeyA,KeyS)
    #[arg(short, long, value_delimiter = ',')]
    keys: Vec<String>,

    /// Seconds each key is held
    #[arg(long, default_value = "0.5")]
    hold: f64,

    /// Envelope samples printed per key
    #[arg(long, default_value = "8")]
    samples: usize,

    /// Settings file (defaults to the user settings)
    #[arg(long)]
    settings: Option<PathBuf>,
}

pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    if !(args.hold.is_finite() && args.hold > 0.0) {
        anyhow::bail!("--hold must be a positive number of seconds");
    }
    let document = load_document(&args.document)?;
    let settings = load_settings(args.settings.as_deref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("could not start the runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, simulate(&args, &document, settings))
}

async fn simulate(
    args: &SimulateArgs,
    document: &resonode_core::Document,
    settings: resonode_config::EngineSettings,
) -> anyhow::Result<()> {
    let backend = RecordingBackend::new(f64::from(settings.backend.sample_rate));
    let session = Session::new(backend, settings)?;

    let import = session.import_document(document);
    println!(
        "Imported {} nodes, {} connections",
        import.imported_nodes, import.imported_connections
    );
    for (id, error) in &import.failed {
        println!("  dropped node {id}: {error}");
    }
    session.idle().await;

    let Some(report) = session.last_report() else {
        anyhow::bail!("no reconciliation pass ran");
    };
    match &report.outcome {
        Ok(summary) => println!("Pass {}: {summary}", report.pass),
        Err(e) => anyhow::bail!("pass {} failed: {e}", report.pass),
    }
    for (class, count) in session.with_backend(RecordingBackend::live_counts) {
        println!("  {:20} {count}", class.name());
    }
    for visualizer in session.visualizers() {
        println!(
            "  visualizer {} ({:?}) on {}",
            visualizer.node, visualizer.mode, visualizer.analyser
        );
    }

    for code in &args.keys {
        let key = KeyCode::parse(code).with_context(|| format!("unknown key code '{code}'"))?;
        press(&session, key, args.hold, args.samples);
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)] // Sample counts are small
fn press(session: &Session<RecordingBackend>, key: KeyCode, hold: f64, samples: usize) {
    let voices = session.voices(key);
    println!();
    if voices.is_empty() {
        println!("{key}: no voices");
        return;
    }

    let start = session.with_backend(|b| b.current_time());
    session.key_down(key.as_str(), false);
    session.with_backend_mut(|b| b.advance_by(hold));
    session.key_up(key.as_str(), false);

    for (index, (voice, profile)) in voices.iter().enumerate() {
        let span = hold + profile.release_length;
        println!("{key} voice {}: {} over {span:.2}s", index + 1, voice.gain);
        let steps = samples.max(2);
        for step in 0..steps {
            let offset = span * step as f64 / (steps - 1) as f64;
            let level = session.with_backend(|b| b.value_at(voice.gain, start + offset));
            println!("  t={offset:6.3}s  gain={level:.4}");
        }
    }
}
