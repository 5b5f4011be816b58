//! # Event Bus System
//!
//! Typed, broadcast-based notifications from the playback core to anything
//! that renders its state (mini-player, OS widgets, host analytics).
//!
//! ## Overview
//!
//! - **Event Types**: one enum per domain (`PlaybackEvent`, `QueueEvent`,
//!   `WaveformEvent`) wrapped by [`CoreEvent`]
//! - **EventBus**: a `tokio::sync::broadcast` channel; clone it to publish
//!   from several places
//! - **EventStream**: a receiver with an optional filter predicate
//!
//! ```text
//! ┌──────────────┐    emit     ┌───────────┐   subscribe   ┌─────────────┐
//! │ Broker       ├────────────>│           ├──────────────>│ Mini-player │
//! └──────────────┘             │ EventBus  │               └─────────────┘
//! ┌──────────────┐    emit     │           │   subscribe   ┌─────────────┐
//! │ Waveform svc ├────────────>│           ├──────────────>│ Host        │
//! └──────────────┘             └───────────┘               └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(64);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Closed)).ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event, CoreEvent::Playback(PlaybackEvent::Closed));
//! # }
//! ```
//!
//! ## Payload conventions
//!
//! Positions and durations travel as integer milliseconds and progress as an
//! integer percentage so every event is `Eq` and serializes without float
//! noise. Resource kinds and modes travel as their lowercase string names;
//! this crate does not depend on the playback crate.
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal;
//!   progress events are superseded by the next tick anyway.
//! - **`RecvError::Closed`**: every sender was dropped, i.e. the engine shut down.
//!
//! Emitting with no subscribers returns `Err`; publishers in the core ignore it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 128;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Ownership and transport changes
    Playback(PlaybackEvent),
    /// Queue construction and advance decisions
    Queue(QueueEvent),
    /// Waveform analysis results
    Waveform(WaveformEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Queue(e) => e.description(),
            CoreEvent::Waveform(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Rejected { .. }) => EventSeverity::Warning,
            CoreEvent::Waveform(WaveformEvent::Fallback { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::Activated { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::Closed) => EventSeverity::Info,
            CoreEvent::Queue(QueueEvent::Replaced { .. }) => EventSeverity::Info,
            CoreEvent::Queue(QueueEvent::RepeatModeChanged { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Ownership changes and transport state of the authoritative resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A resource became the sole active source.
    Activated {
        source_url: String,
        /// `inline_audio`, `inline_video` or `background`.
        kind: String,
        /// Monotonic activation counter; later activations always win.
        generation: u64,
    },
    /// The authoritative resource started producing output.
    Started { source_url: String, title: String },
    /// The authoritative resource paused.
    Paused { source_url: String, position_ms: u64 },
    /// Periodic progress sample.
    Progress {
        source_url: String,
        position_ms: u64,
        duration_ms: u64,
        percent: u8,
    },
    /// The authoritative resource reached its natural end.
    Ended { source_url: String },
    /// Background audio was snapshotted to let a video play.
    Interrupted { source_url: String, position_ms: u64 },
    /// Snapshotted audio was restored after the interrupting video ended.
    InterruptResumed { source_url: String, position_ms: u64 },
    /// A resource refused to start (autoplay policy or similar).
    Rejected { source_url: String, message: String },
    /// An embedded frame reported a track the core does not own.
    ExternalNowPlaying { title: String, byline: String },
    /// Playback was closed and timers cleared.
    Closed,
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Activated { .. } => "Playback resource activated",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Progress { .. } => "Playback progress",
            PlaybackEvent::Ended { .. } => "Track ended",
            PlaybackEvent::Interrupted { .. } => "Audio interrupted by video",
            PlaybackEvent::InterruptResumed { .. } => "Interrupted audio resumed",
            PlaybackEvent::Rejected { .. } => "Playback rejected",
            PlaybackEvent::ExternalNowPlaying { .. } => "External track now playing",
            PlaybackEvent::Closed => "Playback closed",
        }
    }
}

// ============================================================================
// Queue Events
// ============================================================================

/// Queue construction and natural-end decisions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum QueueEvent {
    /// The queue was replaced atomically.
    Replaced {
        /// `explicit` or `implicit`.
        mode: String,
        length: u32,
        current_index: u32,
    },
    /// Playback moved to another queue entry.
    Advanced {
        from_index: u32,
        to_index: u32,
        restarted: bool,
    },
    /// The end of the queue was reached with nothing left to play.
    Exhausted { last_index: u32 },
    /// Repeat mode changed (`off`, `all` or `one`).
    RepeatModeChanged { mode: String },
}

impl QueueEvent {
    fn description(&self) -> &str {
        match self {
            QueueEvent::Replaced { .. } => "Queue replaced",
            QueueEvent::Advanced { .. } => "Queue advanced",
            QueueEvent::Exhausted { .. } => "Queue exhausted",
            QueueEvent::RepeatModeChanged { .. } => "Repeat mode changed",
        }
    }
}

// ============================================================================
// Waveform Events
// ============================================================================

/// Waveform analysis outcomes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum WaveformEvent {
    /// Real decoded heights are cached for this key.
    Ready { source_url: String, bucket_count: u32 },
    /// Analysis failed; the seeded fallback was used instead.
    Fallback {
        source_url: String,
        bucket_count: u32,
        reason: String,
    },
}

impl WaveformEvent {
    fn description(&self) -> &str {
        match self {
            WaveformEvent::Ready { .. } => "Waveform ready",
            WaveformEvent::Fallback { .. } => "Waveform fell back to seeded shape",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Creates a new subscriber wrapped in an [`EventStream`].
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus};
///
/// let bus = EventBus::new(16);
/// let queue_only = bus.stream().filter(|event| matches!(event, CoreEvent::Queue(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
