//! # Host Bridge Traits
//!
//! Contracts between the playback core and the host application that embeds it.
//!
//! ## Overview
//!
//! The core never touches a concrete audio element, browser frame, OS media
//! session or storage backend. Each of those is reached through a trait defined
//! here and implemented by the host (a desktop shell, a webview, a test
//! harness). Hosts hand the implementations to the core at bootstrap.
//!
//! ## Traits
//!
//! ### Playback surfaces
//! - [`PlaybackResource`](playback::PlaybackResource) - Anything that can play audio/video:
//!   inline audio, inline video, and the single long-lived background audio resource
//! - [`SurfaceScanner`](surface::SurfaceScanner) - Enumerates the playable surfaces of the
//!   render context around a clicked surface, in document order
//!
//! ### Cross-surface integration
//! - [`FrameBridge`](frame::FrameBridge) - One-way "silence everything except token X"
//!   broadcast to an embedded secondary frame
//! - [`MediaSessionBridge`](media_session::MediaSessionBridge) - OS transport controls
//!   (now-playing metadata, play/pause/seek handlers)
//!
//! ### Storage & I/O
//! - [`SettingsStore`](storage::SettingsStore) - Durable key-value preferences
//! - [`HttpClient`](http::HttpClient) - Byte fetches for waveform analysis
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Optional capabilities
//!
//! Only `SettingsStore` and the background `PlaybackResource` are mandatory.
//! A missing frame bridge, media session or scanner is a normal condition and
//! never an error: the core simply operates on its own resources.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Hosts
//! should map platform failures (autoplay rejection, unreachable frame,
//! storage quota) onto it; the core decides which ones are swallowed.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind an `Arc`.

pub mod error;
pub mod frame;
pub mod http;
pub mod media_session;
pub mod playback;
pub mod storage;
pub mod surface;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use frame::FrameBridge;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use media_session::{MediaAction, MediaMetadata, MediaSessionBridge};
pub use playback::{PlaybackResource, ResourceEvent, ResourceId, ResourceKind};
pub use storage::SettingsStore;
pub use surface::{ScannedSurface, SurfaceScanner, TrackDescriptor};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, SystemClock};
