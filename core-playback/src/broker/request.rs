//! Inputs to the broker.

use crate::track::{Track, TrackDefaults};
use bridge_traits::PlaybackResource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where the queue for a surface activation comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueueContext {
    /// Play just this surface; no queue.
    #[default]
    Standalone,
    /// Scan the surrounding render context and queue every playable surface
    /// in document order. `defaults` fill in metadata the surfaces omit.
    InContext { defaults: TrackDefaults },
}

/// A request to make something the sole active source.
pub enum ActivationRequest {
    /// An inline audio or video surface the user interacted with.
    Surface {
        resource: Arc<dyn PlaybackResource>,
        track: Track,
        context: QueueContext,
    },
    /// Explicit queue playback (playlists).
    Playlist { tracks: Vec<Track>, start_index: usize },
}

impl ActivationRequest {
    pub fn standalone(resource: Arc<dyn PlaybackResource>, track: Track) -> Self {
        ActivationRequest::Surface {
            resource,
            track,
            context: QueueContext::Standalone,
        }
    }

    pub fn in_context(
        resource: Arc<dyn PlaybackResource>,
        track: Track,
        defaults: TrackDefaults,
    ) -> Self {
        ActivationRequest::Surface {
            resource,
            track,
            context: QueueContext::InContext { defaults },
        }
    }

    pub fn playlist(tracks: Vec<Track>, start_index: usize) -> Self {
        ActivationRequest::Playlist {
            tracks,
            start_index,
        }
    }
}

impl fmt::Debug for ActivationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationRequest::Surface {
                resource,
                track,
                context,
            } => f
                .debug_struct("Surface")
                .field("resource", &resource.id())
                .field("kind", &resource.kind())
                .field("source_url", &track.source_url)
                .field("context", context)
                .finish(),
            ActivationRequest::Playlist {
                tracks,
                start_index,
            } => f
                .debug_struct("Playlist")
                .field("len", &tracks.len())
                .field("start_index", start_index)
                .finish(),
        }
    }
}

/// A track playing inside an embedded frame the core does not control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTrack {
    pub title: String,
    pub byline: String,
    pub cover_url: Option<String>,
}
