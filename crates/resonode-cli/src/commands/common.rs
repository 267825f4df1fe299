//! Helpers shared by several commands.

use std::path::Path;

use anyhow::Context;
use resonode_config::{EngineSettings, resolve_document, settings_path};
use resonode_core::Document;

/// Loads a document from a path, a saved user document, or a factory name.
pub fn load_document(name: &str) -> anyhow::Result<Document> {
    resolve_document(name).with_context(|| format!("could not load document '{name}'"))
}

/// Loads settings from `path`, or from the user settings file when absent.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<EngineSettings> {
    match path {
        Some(path) => EngineSettings::load(path)
            .with_context(|| format!("could not load settings '{}'", path.display())),
        None => {
            let path = settings_path();
            EngineSettings::load_or_default(&path)
                .with_context(|| format!("could not load settings '{}'", path.display()))
        }
    }
}
