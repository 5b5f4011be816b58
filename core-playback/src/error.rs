//! # Playback Error Types
//!
//! Error types for the playback engine and waveform pipeline.
//!
//! Almost nothing here reaches a user: fetch and decode failures fall back to
//! the seeded waveform, rejected `play()` calls are logged, and invalid
//! requests are ignored. Errors are still typed so that callers which *do*
//! want to know (tests, hosts with diagnostics panels) can match on them.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
///
/// `Clone` so one failed decode can be handed to every coalesced waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The request carried no usable source URL.
    #[error("Empty source URL")]
    EmptySource,

    /// Media bytes could not be fetched (network, CORS, non-2xx status).
    #[error("Failed to fetch audio source: {0}")]
    FetchFailed(String),

    /// No byte source is configured, so real analysis is impossible.
    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(String),

    // ========================================================================
    // Format/Codec Errors
    // ========================================================================
    /// Audio format is not recognized or cannot be parsed.
    #[error("Unsupported or invalid audio format: {0}")]
    InvalidFormat(String),

    /// Codec is not supported by the decoder.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// Error occurred during audio decoding.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Decoding finished without producing a single sample.
    #[error("Decoded stream contained no samples")]
    NoSamples,

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// A resource refused to start.
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    /// A resource control call failed.
    #[error("Resource operation failed: {0}")]
    ResourceFailed(String),

    /// Queue index outside `0..len`.
    #[error("Queue index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    // ========================================================================
    // Configuration / Storage
    // ========================================================================
    /// Engine configuration rejected by `validate()`.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Durable settings could not be read or written.
    #[error("Settings storage error: {0}")]
    Storage(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::FetchFailed(_)
                | PlaybackError::SourceUnavailable(_)
                | PlaybackError::PlaybackRejected(_)
        )
    }

    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        matches!(self, PlaybackError::FetchFailed(_))
    }

    /// Returns `true` if this error is related to audio format/codec issues.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidFormat(_)
                | PlaybackError::UnsupportedCodec(_)
                | PlaybackError::DecodingError(_)
                | PlaybackError::NoSamples
        )
    }
}

impl From<BridgeError> for PlaybackError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::PlaybackRejected(msg) => PlaybackError::PlaybackRejected(msg),
            BridgeError::StorageError(msg) => PlaybackError::Storage(msg),
            other => PlaybackError::ResourceFailed(other.to_string()),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
