//! Platform-specific paths for documents and settings.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/resonode/` (Linux), `~/Library/Application Support/resonode/` (macOS), `%APPDATA%\resonode\` (Windows)
//! - **User documents**: `documents/` under the user config directory
//! - **Settings file**: `settings.toml` under the user config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use resonode_config::paths;
//!
//! let dir = paths::user_documents_dir();
//! println!("Documents: {:?}", dir);
//!
//! if let Some(path) = paths::find_document("my_patch") {
//!     println!("Found document at: {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "resonode";

/// Subdirectory name for saved documents.
const DOCUMENTS_SUBDIR: &str = "documents";

/// File name of the engine settings.
const SETTINGS_FILE: &str = "settings.toml";

/// Extension of saved graph documents.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user-specific documents directory.
pub fn user_documents_dir() -> PathBuf {
    user_config_dir().join(DOCUMENTS_SUBDIR)
}

/// Returns the path of the user settings file.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

/// Find a document file by name.
///
/// The name can be a path to an existing file, or a document name (with or
/// without the `.json` extension) looked up in the user documents directory.
pub fn find_document(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }
    find_document_in(&user_documents_dir(), name)
}

/// Find a document by name inside `dir`.
pub fn find_document_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let suffix = format!(".{DOCUMENT_EXTENSION}");
    let filename = if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    };
    let candidate = dir.join(filename);
    candidate.is_file().then_some(candidate)
}

/// Ensure the user documents directory exists.
pub fn ensure_user_documents_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_documents_dir())
}

/// Ensure the user config directory exists.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_config_dir())
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// List all documents in the user documents directory.
pub fn list_user_documents() -> Vec<PathBuf> {
    list_documents_in_dir(&user_documents_dir())
}

/// List all `.json` documents in `dir`, sorted by path.
///
/// A missing or unreadable directory yields an empty list.
pub fn list_documents_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut documents: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == DOCUMENT_EXTENSION)
        })
        .collect();
    documents.sort();
    documents
}

/// Get the document name from a path (file stem without extension).
pub fn document_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(ToString::to_string)
}
