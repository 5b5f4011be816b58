//! # Format Detection Module
//!
//! Probe hints and codec identification for Symphonia.

use crate::error::{PlaybackError, Result};
use symphonia::core::codecs::CodecType;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Codec families the waveform pipeline can identify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCodec {
    Mp3,
    Aac,
    Flac,
    Vorbis,
    Opus,
    Wav,
    Alac,
    Unknown,
}

/// Format detector for fetched media.
///
/// Builds hints for Symphonia's probe from whatever the source URL or HTTP
/// response tells us, and maps probed codec types onto [`AudioCodec`].
pub struct FormatDetector;

impl FormatDetector {
    /// Lowercased file extension of the last path segment of `url`, ignoring
    /// query string and fragment.
    ///
    /// ```rust
    /// use core_playback::decoder::FormatDetector;
    ///
    /// assert_eq!(
    ///     FormatDetector::extension_from_url("https://cdn.example.com/a/b.MP3?sig=1"),
    ///     Some("mp3".to_string())
    /// );
    /// assert_eq!(FormatDetector::extension_from_url("https://cdn.example.com/stream"), None);
    /// ```
    pub fn extension_from_url(url: &str) -> Option<String> {
        let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
        let segment = path.rsplit('/').next()?;
        let (stem, extension) = segment.rsplit_once('.')?;

        if stem.is_empty() || extension.is_empty() || extension.len() > 5 {
            return None;
        }

        Some(extension.to_ascii_lowercase())
    }

    /// Create a probe hint from an optional file extension.
    pub fn hint_from_extension(extension: Option<&str>) -> Hint {
        let mut hint = Hint::new();

        if let Some(extension) = extension {
            debug!("Setting probe hint extension: {}", extension);
            hint.with_extension(extension);
        } else {
            debug!("No file extension found, probe will auto-detect");
        }

        hint
    }

    /// Create a probe hint from a MIME type (`audio/mpeg`, ...).
    pub fn hint_from_mime_type(mime_type: &str) -> Hint {
        let mut hint = Hint::new();
        hint.mime_type(mime_type);
        hint
    }

    /// Map Symphonia's `CodecType` onto [`AudioCodec`].
    pub fn detect_codec(codec_type: CodecType) -> AudioCodec {
        use symphonia::core::codecs::*;

        if codec_type == CODEC_TYPE_MP3 {
            AudioCodec::Mp3
        } else if codec_type == CODEC_TYPE_AAC {
            AudioCodec::Aac
        } else if codec_type == CODEC_TYPE_FLAC {
            AudioCodec::Flac
        } else if codec_type == CODEC_TYPE_VORBIS {
            AudioCodec::Vorbis
        } else if codec_type == CODEC_TYPE_OPUS {
            AudioCodec::Opus
        } else if codec_type == CODEC_TYPE_ALAC {
            AudioCodec::Alac
        } else if codec_type == CODEC_TYPE_PCM_S16LE
            || codec_type == CODEC_TYPE_PCM_S16BE
            || codec_type == CODEC_TYPE_PCM_S24LE
            || codec_type == CODEC_TYPE_PCM_S24BE
            || codec_type == CODEC_TYPE_PCM_S32LE
            || codec_type == CODEC_TYPE_PCM_S32BE
            || codec_type == CODEC_TYPE_PCM_F32LE
            || codec_type == CODEC_TYPE_PCM_F32BE
            || codec_type == CODEC_TYPE_PCM_F64LE
            || codec_type == CODEC_TYPE_PCM_F64BE
            || codec_type == CODEC_TYPE_PCM_U8
        {
            AudioCodec::Wav
        } else {
            warn!("Unknown codec type: {:?}", codec_type);
            AudioCodec::Unknown
        }
    }

    /// Symphonia ships no Opus decoder; everything else identified is decodable.
    pub fn validate_codec_support(codec: &AudioCodec) -> Result<()> {
        match codec {
            AudioCodec::Opus => Err(PlaybackError::UnsupportedCodec(
                "Opus has no bundled decoder".to_string(),
            )),
            AudioCodec::Unknown => Err(PlaybackError::UnsupportedCodec(
                "Unknown audio codec".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
