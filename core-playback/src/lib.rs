//! # Unified Playback Engine
//!
//! Single source of truth for "what is playing" across every audio and video
//! surface the host renders.
//!
//! ## Overview
//!
//! This crate handles:
//! - Exclusive playback ownership: one audible resource at a time, with
//!   inline audio handed off to a persistent background resource
//! - Video interruption of background audio, and resumption when it ends
//! - Explicit (playlist) and implicit (render-context) queues with repeat
//! - Per-track resume positions
//! - Waveform bars from decoded PCM (symphonia, feature-gated), with a
//!   deterministic seeded fallback
//! - The mini-player projection and its controls
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{ActivationRequest, EngineConfig, EngineDependencies, PlaybackEngine, Track};
//!
//! let engine = PlaybackEngine::new(
//!     EngineConfig::default(),
//!     background_audio,
//!     EngineDependencies::new(settings).with_media_session(session),
//! )?;
//! engine.load_repeat_mode().await;
//!
//! let track = Track::new("https://cdn.example.com/ep1.mp3", "Episode 1", "@host");
//! engine.activate(ActivationRequest::standalone(inline_audio, track)).await?;
//! ```

pub mod broker;
pub mod config;
pub mod decoder;
pub mod error;
pub mod format;
pub mod mini_player;
pub mod now_playing;
pub mod queue;
pub mod repeat;
pub mod resume;
pub mod track;
pub mod waveform;

pub use broker::{
    ActivationRequest, EngineDependencies, ExternalTrack, InterruptedState, PlaybackEngine,
    QueueContext,
};
pub use config::EngineConfig;
pub use decoder::PcmDecoder;
pub use error::{PlaybackError, Result};
pub use mini_player::{ControlAction, MiniPlayer, MiniPlayerState, QueueItemView};
pub use now_playing::NowPlaying;
pub use queue::{decide_on_ended, EndAction, Queue, QueueEntry, QueueMode};
pub use repeat::{RepeatController, RepeatMode};
pub use resume::{ResumeRecord, ResumeStore};
pub use track::{Track, TrackDefaults};
pub use waveform::{BarStyle, Waveform, WaveformService};
