//! # Waveform Analysis
//!
//! Fixed-size loudness profiles for the bar visualizations drawn next to
//! audio surfaces.
//!
//! ## Pipeline
//!
//! ```text
//! fetch bytes → decode first channel → RMS per bucket → normalize → cache
//!      │               │
//!      └── failure ────┴──> seeded pseudo-waveform (never cached)
//! ```
//!
//! - [`analyzer`]: pure bucketing and normalization
//! - [`seeded`]: deterministic fallback shape from the track title
//! - [`WaveformService`]: the coalescing cache in front of both

pub mod analyzer;
pub mod seeded;
mod service;

pub use analyzer::BarStyle;
pub use service::{Waveform, WaveformService};

/// File extension used to speed up probing, when the decoder can use one.
#[cfg(feature = "core-decoder")]
pub(crate) fn extension_hint(source_url: &str) -> Option<String> {
    crate::decoder::FormatDetector::extension_from_url(source_url)
}

#[cfg(not(feature = "core-decoder"))]
pub(crate) fn extension_hint(_source_url: &str) -> Option<String> {
    None
}
