//! Engine settings file.

use std::path::Path;
use std::time::Duration;

use resonode_core::NoiseConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunable engine settings, stored as TOML.
///
/// Every section and field is optional in the file; missing values take
/// their defaults.
///
/// # TOML Format
///
/// ```toml
/// [reconcile]
/// fade_ms = 50
/// settle_ms = 50
/// start_delay_ms = 100
/// finish_delay_ms = 50
///
/// [live]
/// ramp_ms = 20
///
/// [output]
/// master_gain = 1.0
///
/// [noise]
/// buffer_seconds = 10.0
/// seed = 305419896
///
/// [backend]
/// sample_rate = 48000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Timed checkpoints of a reconciliation pass.
    pub reconcile: ReconcileSettings,
    /// Live control updates.
    pub live: LiveSettings,
    /// Master output chain.
    pub output: OutputSettings,
    /// Noise buffer generation.
    pub noise: NoiseSettings,
    /// Backend context options.
    pub backend: BackendSettings,
}

/// Checkpoint durations of a reconciliation pass, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileSettings {
    /// Fade-out of the previous graph before it is torn down.
    pub fade_ms: u64,
    /// Pause between teardown and installing the new graph.
    pub settle_ms: u64,
    /// Pause before the new sources start.
    pub start_delay_ms: u64,
    /// Pause before the pass reports completion.
    pub finish_delay_ms: u64,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            fade_ms: 50,
            settle_ms: 50,
            start_delay_ms: 100,
            finish_delay_ms: 50,
        }
    }
}

impl ReconcileSettings {
    /// Fade duration.
    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    /// Settle duration.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Start delay.
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    /// Finish delay.
    pub fn finish_delay(&self) -> Duration {
        Duration::from_millis(self.finish_delay_ms)
    }

    /// Total time one uninterrupted pass takes.
    pub fn pass_duration(&self) -> Duration {
        self.fade() + self.settle() + self.start_delay() + self.finish_delay()
    }
}

/// Live control update options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveSettings {
    /// Linear ramp length applied to live parameter changes.
    pub ramp_ms: u64,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self { ramp_ms: 20 }
    }
}

impl LiveSettings {
    /// Ramp length in seconds, the unit of backend automation.
    pub fn ramp_seconds(&self) -> f64 {
        Duration::from_millis(self.ramp_ms).as_secs_f64()
    }
}

/// Master chain options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Level the master gain fades in to.
    pub master_gain: f64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { master_gain: 1.0 }
    }
}

/// Noise buffer options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Length of each generated buffer.
    pub buffer_seconds: f64,
    /// Generator seed.
    pub seed: u32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        let config = NoiseConfig::default();
        Self {
            buffer_seconds: config.buffer_seconds,
            seed: config.seed,
        }
    }
}

/// Backend context options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Sample rate requested from the backend.
    pub sample_rate: u32,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self { sample_rate: 48000 }
    }
}

impl EngineSettings {
    /// Load settings from a TOML file and validate them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let settings = Self::from_toml(&content)?;
        tracing::debug!("settings_load: {}", path.display());
        Ok(settings)
    }

    /// Load settings from `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(toml_str)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save the settings to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every value against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.reconcile;
        for (field, value) in [
            ("reconcile.fade_ms", r.fade_ms),
            ("reconcile.start_delay_ms", r.start_delay_ms),
            ("reconcile.finish_delay_ms", r.finish_delay_ms),
            ("live.ramp_ms", self.live.ramp_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid_setting(field, "must be greater than 0"));
            }
        }

        if !(0.0..=1.0).contains(&self.output.master_gain) {
            return Err(ConfigError::invalid_setting(
                "output.master_gain",
                format!("{} is outside [0, 1]", self.output.master_gain),
            ));
        }

        if !(self.noise.buffer_seconds.is_finite() && self.noise.buffer_seconds > 0.0) {
            return Err(ConfigError::invalid_setting(
                "noise.buffer_seconds",
                "must be a positive number of seconds",
            ));
        }

        if !(8000..=192_000).contains(&self.backend.sample_rate) {
            return Err(ConfigError::invalid_setting(
                "backend.sample_rate",
                format!("{} is outside [8000, 192000]", self.backend.sample_rate),
            ));
        }

        Ok(())
    }

    /// Noise generator configuration for the audio system.
    pub fn noise_config(&self) -> NoiseConfig {
        NoiseConfig {
            buffer_seconds: self.noise.buffer_seconds,
            seed: self.noise.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.reconcile.fade_ms, 50);
        assert_eq!(settings.reconcile.settle_ms, 50);
        assert_eq!(settings.reconcile.start_delay_ms, 100);
        assert_eq!(settings.reconcile.finish_delay_ms, 50);
        assert_eq!(settings.live.ramp_ms, 20);
        assert_eq!(settings.output.master_gain, 1.0);
        assert_eq!(settings.backend.sample_rate, 48000);
        assert_eq!(settings.noise_config(), NoiseConfig::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let settings = EngineSettings::from_toml("").unwrap();
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn test_partial_section() {
        let settings = EngineSettings::from_toml("[reconcile]\nfade_ms = 200\n").unwrap();
        assert_eq!(settings.reconcile.fade_ms, 200);
        assert_eq!(settings.reconcile.start_delay_ms, 100);
        assert_eq!(settings.live.ramp_ms, 20);
    }

    #[test]
    fn test_pass_duration() {
        let r = ReconcileSettings::default();
        assert_eq!(r.pass_duration(), Duration::from_millis(250));
    }

    #[test]
    fn test_zero_settle_is_allowed() {
        let settings = EngineSettings::from_toml("[reconcile]\nsettle_ms = 0\n").unwrap();
        assert_eq!(settings.reconcile.settle(), Duration::ZERO);
    }

    #[test]
    fn test_zero_fade_is_rejected() {
        let err = EngineSettings::from_toml("[reconcile]\nfade_ms = 0\n").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidSetting { ref field, .. } if field == "reconcile.fade_ms")
        );
    }

    #[test]
    fn test_master_gain_range() {
        let err = EngineSettings::from_toml("[output]\nmaster_gain = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("output.master_gain"));
    }

    #[test]
    fn test_sample_rate_range() {
        let mut settings = EngineSettings::default();
        settings.backend.sample_rate = 4000;
        assert!(settings.validate().is_err());
        settings.backend.sample_rate = 192_000;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_bad_toml() {
        let err = EngineSettings::from_toml("[reconcile\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_ramp_seconds() {
        assert!((LiveSettings::default().ramp_seconds() - 0.02).abs() < 1e-12);
    }
}
