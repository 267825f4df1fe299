//! Graph document files.

use std::path::Path;

use resonode_core::Document;

use crate::error::ConfigError;

/// Load a graph document from a JSON file.
pub fn load_document(path: impl AsRef<Path>) -> Result<Document, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let document = Document::from_json(&content)?;
    tracing::debug!(
        "document_load: {} ({} nodes, {} connections)",
        path.display(),
        document.nodes.len(),
        document.connections.len()
    );
    Ok(document)
}

/// Save a graph document as pretty-printed JSON, creating parent directories.
pub fn save_document(document: &Document, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }

    let content = document.to_json_pretty()?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
    tracing::debug!("document_save: {}", path.display());
    Ok(())
}

/// Resolve `name` to a document: a factory document by name first, then a
/// file path or a saved user document.
pub fn resolve_document(name: &str) -> Result<Document, ConfigError> {
    if let Some(document) = crate::factory_documents::get_factory_document(name) {
        return Ok(document);
    }
    let path =
        crate::paths::find_document(name).ok_or_else(|| ConfigError::DocumentNotFound(name.into()))?;
    load_document(path)
}
