//! # Mini-Player Adapter
//!
//! Read-only projection of the engine for the persistent mini-player, plus
//! the handful of controls it exposes. Holds no state of its own: every
//! [`MiniPlayer::state`] call reads the engine fresh, and every control is
//! forwarded to it.

use crate::broker::PlaybackEngine;
use crate::error::Result;
use crate::format::{format_clock, ticker_text};
use crate::queue::QueueMode;
use crate::repeat::RepeatMode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One row of the queue list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItemView {
    pub index: usize,
    pub title: String,
    pub byline: String,
    pub current: bool,
}

/// Everything the mini-player renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniPlayerState {
    /// Hidden while nothing is loaded.
    pub visible: bool,
    pub title: String,
    pub byline: String,
    pub cover_url: Option<String>,
    pub playing: bool,
    pub percent: u8,
    /// `m:ss` / `h:mm:ss`
    pub elapsed: String,
    pub total: String,
    /// Scrolling "Title · byline" text.
    pub ticker: String,
    pub repeat: RepeatMode,
    pub queue_mode: Option<QueueMode>,
    pub queue: Vec<QueueItemView>,
    /// The track belongs to an embedded frame; transport is limited.
    pub external: bool,
}

/// User input from the mini-player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "value")]
pub enum ControlAction {
    TogglePlay,
    /// 0-100
    SeekToPercent(f64),
    SkipNext,
    SkipPrevious,
    CycleRepeat,
    PlayQueueItem(usize),
    Close,
}

/// Thin adapter between the mini-player UI and [`PlaybackEngine`].
#[derive(Clone)]
pub struct MiniPlayer {
    engine: Arc<PlaybackEngine>,
}

impl MiniPlayer {
    pub fn new(engine: Arc<PlaybackEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<PlaybackEngine> {
        &self.engine
    }

    pub async fn state(&self) -> MiniPlayerState {
        let now = self.engine.now_playing();
        let queue = self.engine.queue().await;
        let current = queue.current_index();

        let items = queue
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| QueueItemView {
                index,
                title: entry.track.title.clone(),
                byline: entry.track.byline.clone(),
                current: Some(index) == current,
            })
            .collect();

        MiniPlayerState {
            visible: !now.is_idle(),
            ticker: ticker_text(&now.title, &now.byline),
            elapsed: format_clock(now.position_secs),
            total: format_clock(now.duration_secs),
            title: now.title,
            byline: now.byline,
            cover_url: now.cover_url,
            playing: now.playing,
            percent: now.percent,
            repeat: self.engine.repeat_mode(),
            queue_mode: current.map(|_| queue.mode()),
            queue: items,
            external: now.external,
        }
    }

    pub async fn dispatch(&self, action: ControlAction) -> Result<()> {
        debug!(?action, "Mini-player control");
        match action {
            ControlAction::TogglePlay => self.engine.toggle_play().await,
            ControlAction::SeekToPercent(percent) => self.engine.seek_to_percent(percent).await,
            ControlAction::SkipNext => self.engine.skip_next().await,
            ControlAction::SkipPrevious => self.engine.skip_previous().await,
            ControlAction::CycleRepeat => {
                self.engine.cycle_repeat_mode().await;
                Ok(())
            }
            ControlAction::PlayQueueItem(index) => self.engine.play_at(index, false).await,
            ControlAction::Close => self.engine.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_action_wire_format() {
        let json = serde_json::to_string(&ControlAction::PlayQueueItem(3)).unwrap();
        assert_eq!(json, r#"{"action":"play_queue_item","value":3}"#);

        let parsed: ControlAction = serde_json::from_str(r#"{"action":"close"}"#).unwrap();
        assert_eq!(parsed, ControlAction::Close);
    }
}
