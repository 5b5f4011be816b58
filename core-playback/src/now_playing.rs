//! Snapshot of what the user currently hears.

use crate::format::progress_percent;
use crate::track::Track;
use bridge_traits::MediaMetadata;
use serde::{Deserialize, Serialize};

/// What the mini-player and the OS media session display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub source_url: Option<String>,
    pub title: String,
    pub byline: String,
    pub cover_url: Option<String>,
    pub position_secs: f64,
    pub duration_secs: f64,
    /// `0..=100`; 0 while the duration is unknown.
    pub percent: u8,
    pub playing: bool,
    /// The track belongs to an embedded frame, not to this engine.
    pub external: bool,
}

impl NowPlaying {
    pub fn for_track(track: &Track) -> Self {
        Self {
            source_url: Some(track.source_url.clone()),
            title: track.title.clone(),
            byline: track.byline.clone(),
            cover_url: track.cover_url.clone(),
            ..Default::default()
        }
    }

    /// Nothing is loaded.
    pub fn is_idle(&self) -> bool {
        self.source_url.is_none() && !self.external
    }

    pub(crate) fn set_progress(&mut self, position: f64, duration: f64) {
        self.position_secs = if position.is_finite() { position.max(0.0) } else { 0.0 };
        self.duration_secs = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.percent = progress_percent(self.position_secs, self.duration_secs);
    }

    pub fn media_metadata(&self) -> MediaMetadata {
        MediaMetadata {
            title: self.title.clone(),
            artist: self.byline.clone(),
            artwork: self.cover_url.clone(),
        }
    }
}
