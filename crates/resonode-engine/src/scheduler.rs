//! Rebuild request coalescing.
//!
//! [`RebuildScheduler`] is the pure state machine behind every reconciliation
//! pass. It holds no timers; the session drives it and runs the passes.
//!
//! ```text
//!            request              request
//!   Idle ───────────► Rebuilding ─────────► RebuildPending
//!    ▲                  │   ▲                     │
//!    └──── complete ────┘   └────── complete ─────┘
//! ```
//!
//! Any number of requests during a pass collapse into one pending flag, so
//! the worst case is exactly one extra pass.

/// Scheduler state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RebuildState {
    /// No pass running.
    #[default]
    Idle,
    /// A pass is running and nothing has changed since it started.
    Rebuilding,
    /// A pass is running and another must follow it.
    RebuildPending,
}

/// What the caller must do after [`RebuildScheduler::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The scheduler was idle; start a pass now.
    StartPass,
    /// A pass is already running; the request was folded into the pending flag.
    Coalesced,
}

/// What the caller must do after [`RebuildScheduler::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Requests arrived during the pass; run another one.
    RunAgain,
    /// Back to idle.
    Settled,
}

/// Three-state rebuild scheduler.
#[derive(Debug, Clone, Default)]
pub struct RebuildScheduler {
    state: RebuildState,
    passes: u64,
    coalesced: u64,
}

impl RebuildScheduler {
    /// Creates an idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> RebuildState {
        self.state
    }

    /// True while a pass is running or pending.
    pub fn is_busy(&self) -> bool {
        self.state != RebuildState::Idle
    }

    /// Passes started so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Requests that were folded into an already running pass.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Registers a rebuild request.
    pub fn request(&mut self) -> RequestOutcome {
        match self.state {
            RebuildState::Idle => {
                self.state = RebuildState::Rebuilding;
                self.passes += 1;
                RequestOutcome::StartPass
            }
            RebuildState::Rebuilding | RebuildState::RebuildPending => {
                self.state = RebuildState::RebuildPending;
                self.coalesced += 1;
                RequestOutcome::Coalesced
            }
        }
    }

    /// Marks the running pass as finished.
    ///
    /// Completing while idle is a no-op that reports [`CompletionOutcome::Settled`].
    pub fn complete(&mut self) -> CompletionOutcome {
        match self.state {
            RebuildState::RebuildPending => {
                self.state = RebuildState::Rebuilding;
                self.passes += 1;
                CompletionOutcome::RunAgain
            }
            RebuildState::Rebuilding | RebuildState::Idle => {
                self.state = RebuildState::Idle;
                CompletionOutcome::Settled
            }
        }
    }
}
