//! Render-context scanning.
//!
//! In-context playback (pressing play inside a feed) builds its queue from the
//! playable surfaces around the clicked one. Only the host knows its render
//! tree, so it answers that question through [`SurfaceScanner`].

use crate::playback::ResourceId;
use serde::{Deserialize, Serialize};

/// Track metadata as declared by a rendering collaborator.
///
/// Every field except `source_url` is optional; the core fills the gaps from
/// context before a track enters a queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub source_url: String,
    pub title: Option<String>,
    pub byline: Option<String>,
    pub cover_url: Option<String>,
}

impl TrackDescriptor {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_byline(mut self, byline: impl Into<String>) -> Self {
        self.byline = Some(byline.into());
        self
    }

    pub fn with_cover(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }
}

/// A playable surface discovered in a render context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedSurface {
    pub id: ResourceId,
    pub descriptor: TrackDescriptor,
}

/// Enumerates playable surfaces in the nearest enclosing list or section.
pub trait SurfaceScanner: Send + Sync {
    /// Return every playable surface in the context that contains `anchor`,
    /// in document order. The result must be stable for an unchanged render
    /// tree so that replaying the same context yields the same queue.
    ///
    /// An empty result means the anchor is not inside a scannable context.
    fn scan_context(&self, anchor: ResourceId) -> Vec<ScannedSurface>;
}
