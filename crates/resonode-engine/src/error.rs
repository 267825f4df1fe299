//! Engine error types.

use resonode_core::{
    BackendUnavailableError, BuildError, GraphError, GraphStructureError, ValidationError,
};
use thiserror::Error;

/// Failure of a session operation or of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A graph edit was rejected.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Structural problem outside an edit (unknown node in a live update).
    #[error(transparent)]
    Structure(#[from] GraphStructureError),

    /// A live update was rejected.
    #[error("live update rejected: {0}")]
    Live(#[from] ValidationError),

    /// A pass could not build the staged graph.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The backend could not set up the master chain.
    #[error(transparent)]
    Backend(#[from] BackendUnavailableError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use resonode_core::{NodeId, NodeKind};

    #[test]
    fn test_cycle_is_reported_through_build() {
        let err: EngineError =
            BuildError::from(GraphStructureError::Cycle(NodeId::new("n2"))).into();
        assert!(matches!(
            err,
            EngineError::Build(BuildError::Structure(GraphStructureError::Cycle(_)))
        ));
    }

    #[test]
    fn test_live_display_names_field() {
        let err: EngineError = ValidationError::new(NodeKind::Oscillator, "waveform", "x").into();
        let msg = err.to_string();
        assert!(msg.starts_with("live update rejected"), "got: {msg}");
        assert!(msg.contains("waveform"), "got: {msg}");
    }
}
