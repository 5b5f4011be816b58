//! # Audio Decoder Module
//!
//! Turns fetched media bytes into mono PCM for waveform analysis.
//!
//! ## Overview
//!
//! The waveform pipeline only needs the first channel of a track, as `f32`
//! samples in `[-1.0, 1.0]`. [`PcmDecoder`] is the seam: the waveform service
//! calls it from a blocking task and never cares which library sits behind it.
//!
//! With the `core-decoder` feature (on by default) `SymphoniaPcmDecoder`
//! handles every format Symphonia bundles:
//!
//! | Format | Codec | License |
//! |--------|-------|---------|
//! | MP3 | MPEG-1/2 Audio Layer III | Patents expired |
//! | FLAC | Free Lossless Audio Codec | BSD-3 |
//! | Vorbis | Ogg Vorbis | BSD-3 |
//! | AAC | Advanced Audio Coding | Patent-encumbered |
//! | WAV | Waveform Audio | Public domain |
//! | ALAC | Apple Lossless | Apache 2.0 |
//!
//! ## Pipeline
//!
//! ```text
//! Bytes → MediaSourceStream → FormatReader → Decoder → first-channel f32
//! ```
//!
//! Without the feature no decoder exists and every waveform request falls back
//! to the seeded shape.

use crate::error::Result;
use bytes::Bytes;

#[cfg(feature = "core-decoder")]
mod format_detector;

#[cfg(feature = "core-decoder")]
mod sample_converter;

#[cfg(feature = "core-decoder")]
mod symphonia;

#[cfg(feature = "core-decoder")]
pub use self::symphonia::SymphoniaPcmDecoder;

#[cfg(feature = "core-decoder")]
pub use format_detector::{AudioCodec, FormatDetector};

#[cfg(feature = "core-decoder")]
pub use sample_converter::SampleConverter;

/// Decodes a complete in-memory media file into first-channel PCM.
///
/// Implementations are synchronous and CPU-bound; callers run them on a
/// blocking thread.
pub trait PcmDecoder: Send + Sync {
    /// Decode `data`.
    ///
    /// `extension_hint` is the file extension of the source URL, if any
    /// (`"mp3"`, `"ogg"`...), and only speeds up probing.
    ///
    /// # Errors
    ///
    /// `InvalidFormat`/`UnsupportedCodec` when the container or codec is not
    /// recognized, `DecodingError` when the stream is corrupt, `NoSamples`
    /// when decoding yields nothing.
    fn decode_first_channel(&self, data: Bytes, extension_hint: Option<&str>) -> Result<Vec<f32>>;
}

/// The decoder this build ships with, if any.
pub fn default_decoder() -> Option<std::sync::Arc<dyn PcmDecoder>> {
    #[cfg(feature = "core-decoder")]
    {
        Some(std::sync::Arc::new(SymphoniaPcmDecoder::new()))
    }

    #[cfg(not(feature = "core-decoder"))]
    {
        None
    }
}
