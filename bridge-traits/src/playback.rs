//! Playback surface contract.
//!
//! Every concrete surface the host renders (an audio player inside a feed card,
//! a video inside a post, the single hidden background audio element) is
//! exposed to the core as a [`PlaybackResource`]. The core dispatches on
//! [`ResourceKind`] instead of probing for capabilities at runtime.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Stable identity of a playback surface for the lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Generate a new resource identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The concrete surface type behind a [`PlaybackResource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Audio element rendered inside a card or list row.
    InlineAudio,
    /// Video element rendered inside a card or post.
    InlineVideo,
    /// The long-lived audio element that carries playback across re-renders.
    Background,
}

impl ResourceKind {
    /// Returns `true` for video surfaces.
    pub fn is_video(&self) -> bool {
        matches!(self, ResourceKind::InlineVideo)
    }
}

/// Notifications a surface reports back to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceEvent {
    Play,
    Pause,
    TimeUpdate,
    Ended,
}

/// A host surface able to play, pause and seek a single media source.
///
/// Positions and durations are in seconds. `duration()` returns `0.0` while
/// the duration is unknown. State queries are synchronous snapshots; control
/// operations are async because hosts may have to round-trip to a UI thread,
/// and `play()` may be rejected asynchronously (autoplay policy).
///
/// Implementations must deliver [`ResourceEvent`]s to the core asynchronously,
/// never from inside one of the control calls below.
#[async_trait]
pub trait PlaybackResource: Send + Sync {
    /// Identity of this surface.
    fn id(&self) -> ResourceId;

    /// Surface type used for dispatch.
    fn kind(&self) -> ResourceKind;

    /// Currently loaded source, if any.
    fn source_url(&self) -> Option<String>;

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// Media duration in seconds, `0.0` when unknown.
    fn duration(&self) -> f64;

    /// Whether the surface is currently producing output.
    fn is_playing(&self) -> bool;

    /// Replace the loaded source. Position resets to zero.
    async fn load(&self, source_url: &str) -> Result<()>;

    /// Start or resume output.
    async fn play(&self) -> Result<()>;

    /// Pause output, keeping the position.
    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position in seconds.
    async fn seek(&self, position: f64) -> Result<()>;

    /// Show or hide the surface's own controls.
    async fn set_visible(&self, visible: bool) -> Result<()>;

    /// Bind the surface's visualisation (progress bar, waveform) to another
    /// resource so it keeps tracking playback that physically happens
    /// elsewhere. `None` detaches any proxy.
    fn set_visual_proxy(&self, proxy: Option<Arc<dyn PlaybackResource>>);
}
