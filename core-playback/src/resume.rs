//! # Resume Store
//!
//! Session-lifetime memory of where each source was last heard, plus the
//! heuristics that decide whether resuming there is meaningful.

use bridge_traits::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Last known position of one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub source_url: String,
    pub position_secs: f64,
    /// `0.0` when the duration was unknown at sampling time.
    pub duration_secs: f64,
    pub last_updated_at: DateTime<Utc>,
}

/// In-memory map from source URL to [`ResumeRecord`].
///
/// Records are overwritten on every sample and never deleted; the map lives
/// as long as the engine.
pub struct ResumeStore {
    records: Mutex<HashMap<String, ResumeRecord>>,
    clock: Arc<dyn Clock>,
    finished_threshold_secs: f64,
    min_resume_secs: f64,
}

impl ResumeStore {
    pub fn new(clock: Arc<dyn Clock>, finished_threshold_secs: f64, min_resume_secs: f64) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            clock,
            finished_threshold_secs,
            min_resume_secs,
        }
    }

    /// Store with the system clock and the stock thresholds (1.2s / 0.1s).
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(SystemClock), 1.2, 0.1)
    }

    /// Upsert the position for `source_url`.
    ///
    /// Ignored when `position` is NaN, infinite or negative. A non-finite or
    /// negative duration is stored as unknown (`0.0`).
    pub fn remember(&self, source_url: &str, position: f64, duration: f64) {
        if source_url.is_empty() || !position.is_finite() || position < 0.0 {
            return;
        }

        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };

        let record = ResumeRecord {
            source_url: source_url.to_string(),
            position_secs: position,
            duration_secs: duration,
            last_updated_at: self.clock.now(),
        };

        self.records.lock().insert(source_url.to_string(), record);
    }

    /// Where playback of `source_url` should start, in seconds.
    ///
    /// Returns `0.0` when nothing is recorded, when the recorded position is
    /// too close to the start to matter, or when it is within the finished
    /// threshold of a known duration.
    pub fn resume_time(&self, source_url: &str) -> f64 {
        let records = self.records.lock();
        let Some(record) = records.get(source_url) else {
            return 0.0;
        };

        if record.position_secs <= self.min_resume_secs {
            return 0.0;
        }

        if record.duration_secs > 0.0
            && record.position_secs >= record.duration_secs - self.finished_threshold_secs
        {
            return 0.0;
        }

        record.position_secs
    }

    /// Raw record, if any.
    pub fn record(&self, source_url: &str) -> Option<ResumeRecord> {
        self.records.lock().get(source_url).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Default for ResumeStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}
