//! Settings, document files, and factory documents for resonode.
//!
//! # Features
//!
//! - **Engine Settings**: Reconciliation timings, live ramp, master level, noise, and
//!   backend options in a TOML file
//! - **Documents**: Load and save graph documents as pretty JSON
//! - **Paths**: Platform-specific config and document directories
//! - **Factory Documents**: Built-in graphs that are always available
//!
//! # Example
//!
//! ```rust,no_run
//! use resonode_config::{EngineSettings, load_document, save_document, user_documents_dir};
//!
//! let settings = EngineSettings::load_or_default(resonode_config::settings_path()).unwrap();
//! println!("fade: {:?}", settings.reconcile.fade());
//!
//! let doc = load_document("patch.json").unwrap();
//! save_document(&doc, user_documents_dir().join("patch.json")).unwrap();
//! ```

mod documents;
mod error;
mod settings;

/// Platform-specific paths for documents and settings.
pub mod paths;

/// Factory documents bundled with the library.
pub mod factory_documents;

pub use documents::{load_document, resolve_document, save_document};
pub use error::ConfigError;
pub use factory_documents::{
    FACTORY_DOCUMENT_NAMES, factory_document_names, factory_documents, get_factory_document,
    is_factory_document,
};
pub use paths::{
    document_name_from_path, ensure_user_config_dir, ensure_user_documents_dir, find_document,
    list_documents_in_dir, list_user_documents, settings_path, user_config_dir,
    user_documents_dir,
};
pub use settings::{
    BackendSettings, EngineSettings, LiveSettings, NoiseSettings, OutputSettings,
    ReconcileSettings,
};
