//! Codegen error types.

use resonode_core::{GraphStructureError, NodeImportError, UnsupportedKindError, ValidationError};
use thiserror::Error;

/// Why a document could not be compiled. No partial program is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    /// A node's kind tag is not in the catalogue.
    #[error("codegen aborted: {0}")]
    Unsupported(#[from] UnsupportedKindError),

    /// A node's data failed validation.
    #[error("codegen aborted: {0}")]
    Validation(#[from] ValidationError),

    /// A connection or node id does not fit the document's nodes.
    #[error("codegen aborted: {0}")]
    Structure(#[from] GraphStructureError),
}

impl From<NodeImportError> for CodegenError {
    fn from(err: NodeImportError) -> Self {
        match err {
            NodeImportError::Unsupported(e) => Self::Unsupported(e),
            NodeImportError::Validation(e) => Self::Validation(e),
            NodeImportError::Structure(e) => Self::Structure(e),
        }
    }
}
