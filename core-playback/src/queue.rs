//! # Queue Manager
//!
//! Ordered tracks plus a current index, and the pure decision of what to do
//! when the current track ends.
//!
//! Queues come in two disjoint flavours that are never mixed:
//! - **Explicit**: the caller hands over the full list (playlist playback).
//! - **Implicit**: built by scanning the render context around the clicked
//!   surface, in document order, so the same context always yields the same
//!   ordering regardless of which item was clicked.

use crate::repeat::RepeatMode;
use crate::track::{Track, TrackDefaults};
use bridge_traits::{ResourceId, ResourceKind, ScannedSurface};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the queue was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    Explicit,
    Implicit,
}

impl QueueMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueMode::Explicit => "explicit",
            QueueMode::Implicit => "implicit",
        }
    }
}

impl fmt::Display for QueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One queued track, remembering the inline surface it was scanned from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub track: Track,
    /// Present for implicit queues only.
    pub surface: Option<ResourceId>,
}

impl QueueEntry {
    pub fn new(track: Track) -> Self {
        Self {
            track,
            surface: None,
        }
    }

    pub fn from_surface(track: Track, surface: ResourceId) -> Self {
        Self {
            track,
            surface: Some(surface),
        }
    }
}

/// Tracks plus a current index.
///
/// Entries and index are only ever replaced together, so the index can never
/// point into a stale list. `current_index` is `None` exactly when the queue
/// is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queue {
    entries: Vec<QueueEntry>,
    current: Option<usize>,
    mode: QueueMode,
}

impl Default for Queue {
    fn default() -> Self {
        Self::empty()
    }
}

impl Queue {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            current: None,
            mode: QueueMode::Explicit,
        }
    }

    /// Explicit queue starting at `start_index`.
    ///
    /// Returns `None` for an empty list or an out-of-range start.
    pub fn explicit(tracks: Vec<Track>, start_index: usize) -> Option<Self> {
        if start_index >= tracks.len() {
            return None;
        }

        Some(Self {
            entries: tracks.into_iter().map(QueueEntry::new).collect(),
            current: Some(start_index),
            mode: QueueMode::Explicit,
        })
    }

    /// Implicit queue from a context scan, positioned on `anchor`.
    ///
    /// Surfaces without a source URL are skipped. Returns `None` if the
    /// anchor is not among the playable surfaces.
    pub fn implicit(
        scanned: &[ScannedSurface],
        anchor: ResourceId,
        defaults: &TrackDefaults,
    ) -> Option<Self> {
        let entries: Vec<QueueEntry> = scanned
            .iter()
            .filter_map(|surface| {
                Track::resolve(&surface.descriptor, defaults)
                    .map(|track| QueueEntry::from_surface(track, surface.id))
            })
            .collect();

        let current = entries
            .iter()
            .position(|entry| entry.surface == Some(anchor))?;

        Some(Self {
            entries,
            current: Some(current),
            mode: QueueMode::Implicit,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mode(&self) -> QueueMode {
        self.mode
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Move the cursor. Out-of-range indices are refused and leave the
    /// queue untouched.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.current = Some(index);
        true
    }

    /// Where "next" goes: the following entry, or the first one with
    /// restart semantics under `repeat=all`.
    pub fn next_index(&self, repeat: RepeatMode) -> Option<(usize, bool)> {
        let current = self.current?;
        if current + 1 < self.entries.len() {
            Some((current + 1, false))
        } else if repeat == RepeatMode::All {
            Some((0, true))
        } else {
            None
        }
    }

    pub fn previous_index(&self) -> Option<usize> {
        self.current.and_then(|current| current.checked_sub(1))
    }
}

/// What the broker should do after the authoritative resource ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndAction {
    /// Restore the audio snapshotted when a video took over.
    ResumeInterrupted,
    /// Play the queue entry at `index`, from 0 if `restart`.
    PlayAt { index: usize, restart: bool },
    /// No queue: seek the lone resource to 0 and play it again.
    RestartLone,
    /// Nothing left; leave the index where it is.
    Stop,
}

/// Natural-end decision.
///
/// A video ending while audio is snapshotted always resumes that audio,
/// ahead of any repeat or advance rule.
pub fn decide_on_ended(
    ended: ResourceKind,
    has_interrupted: bool,
    queue: &Queue,
    repeat: RepeatMode,
) -> EndAction {
    if ended.is_video() && has_interrupted {
        return EndAction::ResumeInterrupted;
    }

    let Some(current) = queue.current_index() else {
        return match repeat {
            RepeatMode::Off => EndAction::Stop,
            RepeatMode::One | RepeatMode::All => EndAction::RestartLone,
        };
    };

    match repeat {
        RepeatMode::One => EndAction::PlayAt {
            index: current,
            restart: true,
        },
        RepeatMode::Off | RepeatMode::All => match queue.next_index(repeat) {
            Some((index, restart)) => EndAction::PlayAt { index, restart },
            None => EndAction::Stop,
        },
    }
}
