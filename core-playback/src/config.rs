//! # Engine Configuration
//!
//! Tunables for the broker, resume heuristics and waveform rendering.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback engine configuration.
///
/// Every field has a serde default so hosts can ship a partial JSON/TOML
/// override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// A remembered position this close to the end counts as finished.
    ///
    /// Default: 1.2 seconds.
    #[serde(default = "default_finished_threshold_secs")]
    pub finished_threshold_secs: f64,

    /// Remembered positions at or below this are treated as "from the start".
    ///
    /// Default: 0.1 seconds.
    #[serde(default = "default_min_resume_secs")]
    pub min_resume_secs: f64,

    /// Bars per waveform when the caller doesn't specify.
    ///
    /// Default: 54.
    #[serde(default = "default_bucket_count")]
    pub default_bucket_count: usize,

    /// Height of the quietest bar, in visual units.
    ///
    /// Default: 4.0.
    #[serde(default = "default_min_bar_height")]
    pub min_bar_height: f32,

    /// Height of the loudest bar, in visual units.
    ///
    /// Default: 24.0.
    #[serde(default = "default_max_bar_height")]
    pub max_bar_height: f32,

    /// Floor for the normalization divisor so an all-silent track does not
    /// divide by zero.
    ///
    /// Default: 1e-4.
    #[serde(default = "default_silence_epsilon")]
    pub silence_epsilon: f32,

    /// Settings key the repeat mode is persisted under.
    #[serde(default = "default_repeat_storage_key")]
    pub repeat_storage_key: String,

    /// How often the authoritative resource is sampled into the resume store.
    ///
    /// Default: 1 second.
    #[serde(default = "default_progress_sample_interval")]
    pub progress_sample_interval: Duration,

    /// Offset applied by seek-backward / seek-forward transport actions.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,

    /// Past this position, "previous" restarts the current track instead of
    /// moving back in the queue.
    ///
    /// Default: 3 seconds.
    #[serde(default = "default_restart_previous_after_secs")]
    pub restart_previous_after_secs: f64,

    /// Warm the waveform cache when audio is activated.
    ///
    /// Default: true.
    #[serde(default = "default_prefetch_waveforms")]
    pub prefetch_waveforms: bool,

    /// Maximum time to wait for media bytes.
    ///
    /// Default: 30 seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            finished_threshold_secs: default_finished_threshold_secs(),
            min_resume_secs: default_min_resume_secs(),
            default_bucket_count: default_bucket_count(),
            min_bar_height: default_min_bar_height(),
            max_bar_height: default_max_bar_height(),
            silence_epsilon: default_silence_epsilon(),
            repeat_storage_key: default_repeat_storage_key(),
            progress_sample_interval: default_progress_sample_interval(),
            seek_step_secs: default_seek_step_secs(),
            restart_previous_after_secs: default_restart_previous_after_secs(),
            prefetch_waveforms: default_prefetch_waveforms(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(PlaybackError::InvalidConfig(msg.to_string()));

        if !(self.finished_threshold_secs >= 0.0) {
            return invalid("finished_threshold_secs must be >= 0");
        }

        if !(self.min_resume_secs >= 0.0) {
            return invalid("min_resume_secs must be >= 0");
        }

        if self.default_bucket_count == 0 {
            return invalid("default_bucket_count must be > 0");
        }

        if !(self.min_bar_height >= 0.0) || self.min_bar_height > self.max_bar_height {
            return invalid("bar heights must satisfy 0 <= min_bar_height <= max_bar_height");
        }

        if !(self.silence_epsilon > 0.0) {
            return invalid("silence_epsilon must be > 0");
        }

        if self.repeat_storage_key.trim().is_empty() {
            return invalid("repeat_storage_key cannot be empty");
        }

        if self.progress_sample_interval.is_zero() {
            return invalid("progress_sample_interval must be > 0");
        }

        if !(self.seek_step_secs > 0.0) {
            return invalid("seek_step_secs must be > 0");
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_finished_threshold_secs() -> f64 {
    1.2
}

fn default_min_resume_secs() -> f64 {
    0.1
}

fn default_bucket_count() -> usize {
    54
}

fn default_min_bar_height() -> f32 {
    4.0
}

fn default_max_bar_height() -> f32 {
    24.0
}

fn default_silence_epsilon() -> f32 {
    1e-4
}

fn default_repeat_storage_key() -> String {
    "playback.repeat_mode".to_string()
}

fn default_progress_sample_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_seek_step_secs() -> f64 {
    10.0
}

fn default_restart_previous_after_secs() -> f64 {
    3.0
}

fn default_prefetch_waveforms() -> bool {
    true
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}
