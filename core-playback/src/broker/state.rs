//! Broker-owned state. Only `PlaybackEngine` mutates it, always under the
//! engine's state lock.

use crate::queue::Queue;
use crate::track::Track;
use bridge_traits::{PlaybackResource, ResourceId};
use std::sync::Arc;

/// Audio snapshotted when a video took over, restored when that video ends.
#[derive(Debug, Clone, PartialEq)]
pub struct InterruptedState {
    pub source_url: String,
    pub position_secs: f64,
    /// The background resource that was producing the audio.
    pub resource: ResourceId,
    /// Inline surface whose visuals were proxied to the background, if any.
    pub origin: Option<ResourceId>,
    pub track: Track,
    pub queue: Queue,
}

/// The resource whose events count.
#[derive(Clone)]
pub(crate) struct Authority {
    pub resource: Arc<dyn PlaybackResource>,
    /// Inline audio surface handed off to the background resource.
    pub origin: Option<Arc<dyn PlaybackResource>>,
}

impl Authority {
    pub fn is(&self, id: ResourceId) -> bool {
        self.resource.id() == id
    }

    pub fn has_origin(&self, id: ResourceId) -> bool {
        self.origin.as_ref().is_some_and(|origin| origin.id() == id)
    }
}

#[derive(Default)]
pub(crate) struct EngineState {
    /// Bumped by every activation; a `play()` that resolves under an older
    /// generation is stale.
    pub generation: u64,
    pub authority: Option<Authority>,
    pub interrupted: Option<InterruptedState>,
    pub queue: Queue,
    pub track: Option<Track>,
    pub external: bool,
}

impl EngineState {
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn authoritative(&self) -> Option<Arc<dyn PlaybackResource>> {
        self.authority.as_ref().map(|a| a.resource.clone())
    }

    pub fn is_authoritative(&self, id: ResourceId) -> bool {
        self.authority.as_ref().is_some_and(|a| a.is(id))
    }
}
