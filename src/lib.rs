//! Workspace façade crate.
//!
//! This crate exposes the feature flags that map onto the individual workspace
//! crates (`core-service`, `core-playback`). Host applications can depend on
//! `feedplay-workspace`, enable the documented features, and reach the engine
//! through the re-exported façade without wiring each crate by hand.

#[cfg(feature = "desktop-shims")]
pub use core_service::{desktop_config, CoreError, PlaybackService};

#[cfg(feature = "symphonia-decoder")]
pub use core_playback::decoder::SymphoniaPcmDecoder;
