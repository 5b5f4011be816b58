//! System media-control integration (lock screen, hardware keys, OS widgets).

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Now-playing metadata shown by the operating system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    pub artist: String,
    pub artwork: Option<String>,
}

/// Transport actions the OS can forward back to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaAction {
    Play,
    Pause,
    SeekBackward,
    SeekForward,
    NextTrack,
    PreviousTrack,
}

/// Host media session.
///
/// Hosts forward user actions to the core's `handle_media_action`. A host
/// without a media session simply doesn't provide this bridge.
#[async_trait]
pub trait MediaSessionBridge: Send + Sync {
    async fn set_metadata(&self, metadata: MediaMetadata) -> Result<()>;

    async fn set_playback_state(&self, playing: bool) -> Result<()>;

    /// Declare which actions the core is able to handle.
    async fn set_supported_actions(&self, actions: &[MediaAction]) -> Result<()>;
}
