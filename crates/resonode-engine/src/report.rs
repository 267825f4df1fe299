//! Pass and live-update outcomes.

use std::collections::BTreeMap;
use std::fmt;

use resonode_core::{LiveGraph, PrimitiveClass, VoiceRegistry};

use crate::error::EngineError;

/// What a successful pass installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Primitives built, by class.
    pub primitives: BTreeMap<PrimitiveClass, usize>,
    /// Continuous sources started.
    pub sources: usize,
    /// Keyboard voices registered.
    pub voices: usize,
}

impl PassSummary {
    pub(crate) fn of(live: &LiveGraph, voices: &VoiceRegistry) -> Self {
        Self {
            primitives: live.counts(),
            sources: live.sources().count(),
            voices: voices.voice_count(),
        }
    }

    /// Number of primitives of `class`.
    pub fn count(&self, class: PrimitiveClass) -> usize {
        self.primitives.get(&class).copied().unwrap_or(0)
    }

    /// Total primitives built.
    pub fn total(&self) -> usize {
        self.primitives.values().sum()
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} primitives, {} sources, {} voices",
            self.total(),
            self.sources,
            self.voices
        )
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    /// Pass number, starting at 1.
    pub pass: u64,
    /// What was installed, or why the previous graph was kept.
    pub outcome: Result<PassSummary, EngineError>,
}

impl PassReport {
    /// True when the pass installed a new graph.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Outcome of a live control update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiveUpdate {
    /// The parameter is ramping to `value`, already clamped to the control's domain.
    Applied {
        /// Value the parameter ramps to.
        value: f64,
    },
    /// The control's socket is connected, so the inline value has no effect.
    Bypassed,
    /// The node is not part of the running graph (not reachable from a sink,
    /// or no pass has installed it yet).
    NotBuilt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_count_and_display() {
        let mut summary = PassSummary::default();
        summary.primitives.insert(PrimitiveClass::Gain, 2);
        summary.primitives.insert(PrimitiveClass::Oscillator, 1);
        summary.sources = 1;
        assert_eq!(summary.count(PrimitiveClass::Gain), 2);
        assert_eq!(summary.count(PrimitiveClass::Delay), 0);
        assert_eq!(summary.to_string(), "3 primitives, 1 sources, 0 voices");
    }
}
