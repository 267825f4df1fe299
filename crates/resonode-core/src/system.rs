//! The audio system context: backend, master chain, and running sources.

use crate::backend::{AudioBackend, Destination, Param, ParamRef, PrimitiveId, PrimitiveSpec};
use crate::error::BackendUnavailableError;
use crate::graph::LiveGraph;
use crate::noise::NoiseConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActiveSource {
    id: PrimitiveId,
    started: bool,
}

/// Owns the backend and everything that outlives a single pass.
///
/// ```text
/// sinks ──► master gain ──► master compressor ──► destination
/// ```
///
/// The master gain starts silent; passes fade it in after starting sources
/// and fade it out before stopping them.
#[derive(Debug)]
pub struct AudioSystem<B> {
    backend: B,
    master: PrimitiveId,
    compressor: PrimitiveId,
    master_level: f64,
    noise: NoiseConfig,
    sources: Vec<ActiveSource>,
}

impl<B: AudioBackend> AudioSystem<B> {
    /// Builds the master chain on `backend`.
    pub fn new(
        mut backend: B,
        master_level: f64,
        noise: NoiseConfig,
    ) -> Result<Self, BackendUnavailableError> {
        let master = backend.create(PrimitiveSpec::Gain { gain: 0.0 })?;
        let compressor = backend.create(PrimitiveSpec::DynamicsCompressor)?;
        let destination = backend.destination();
        backend.connect(master, Destination::Input(compressor));
        backend.connect(compressor, Destination::Input(destination));
        Ok(Self {
            backend,
            master,
            compressor,
            master_level: master_level.clamp(0.0, 1.0),
            noise,
            sources: Vec::new(),
        })
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Gain every audible sink patches into.
    pub fn master_input(&self) -> PrimitiveId {
        self.master
    }

    /// Master compressor between the master gain and the destination.
    pub fn master_compressor(&self) -> PrimitiveId {
        self.compressor
    }

    /// Level the master gain fades in to.
    pub fn master_level(&self) -> f64 {
        self.master_level
    }

    /// Changes the fade-in level, clamped to `[0, 1]`. Applies from the next fade in.
    pub fn set_master_level(&mut self, level: f64) {
        self.master_level = level.clamp(0.0, 1.0);
    }

    /// Noise buffer settings for builds.
    pub fn noise(&self) -> NoiseConfig {
        self.noise
    }

    /// Number of tracked sources that have been started.
    pub fn started_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.started).count()
    }

    /// Number of tracked sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Tracks the continuous sources of a freshly installed live graph, unstarted.
    pub fn adopt_sources(&mut self, live: &LiveGraph) {
        self.sources = live
            .sources()
            .map(|id| ActiveSource { id, started: false })
            .collect();
    }

    /// Ramps the master gain to zero over `ramp` seconds and stops every
    /// started source at the end of the ramp.
    ///
    /// Returns false, doing nothing, when no source was playing.
    pub fn fade_out_and_stop(&mut self, ramp: f64) -> bool {
        if !self.sources.iter().any(|s| s.started) {
            return false;
        }
        let gain = ParamRef::new(self.master, Param::Gain);
        self.backend.ramp_linear(gain, 0.0, ramp);
        let end = self.backend.current_time() + ramp;
        for source in self.sources.iter_mut().filter(|s| s.started) {
            self.backend.stop(source.id, end);
            source.started = false;
        }
        tracing::debug!("master_fade: out over {ramp}s");
        true
    }

    /// Starts every unstarted source now and ramps the master gain to its
    /// level over `ramp` seconds.
    pub fn start_and_fade_in(&mut self, ramp: f64) {
        let now = self.backend.current_time();
        for source in self.sources.iter_mut().filter(|s| !s.started) {
            self.backend.start(source.id, now);
            source.started = true;
        }
        let gain = ParamRef::new(self.master, Param::Gain);
        self.backend.ramp_linear(gain, self.master_level, ramp);
        tracing::debug!(
            "master_fade: in over {ramp}s with {} sources",
            self.sources.len()
        );
    }

    /// Disconnects every primitive of a discarded live graph.
    pub fn release(&mut self, live: LiveGraph) {
        let released: Vec<PrimitiveId> = live.primitives().iter().map(|(id, _)| *id).collect();
        self.sources.retain(|s| !released.contains(&s.id));
        live.release(&mut self.backend);
    }

    /// Suspends or resumes rendering.
    pub fn set_running(&mut self, running: bool) {
        self.backend.set_running(running);
    }

    /// True while the backend renders.
    pub fn is_running(&self) -> bool {
        self.backend.is_running()
    }
}
