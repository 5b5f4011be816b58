//! # Repeat Controller
//!
//! Process-wide tri-state repeat mode, persisted through the host
//! `SettingsStore` on every change.

use bridge_traits::SettingsStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happens when a track ends naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Advance through the queue and stop after the last entry.
    #[default]
    Off,
    /// Advance and wrap from the last entry back to the first.
    All,
    /// Replay the current entry.
    One,
}

impl RepeatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::All => "all",
            RepeatMode::One => "one",
        }
    }

    /// Parse a stored value. Anything unrecognized is `Off`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => RepeatMode::All,
            "one" => RepeatMode::One,
            _ => RepeatMode::Off,
        }
    }

    /// off → all → one → off
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner of the current [`RepeatMode`].
///
/// Reads are synchronous; writes update memory first and then persist. A
/// failed write is logged and the in-memory value is kept, so the mode is
/// still honoured for the rest of the session.
pub struct RepeatController {
    mode: RwLock<RepeatMode>,
    store: Arc<dyn SettingsStore>,
    key: String,
}

impl RepeatController {
    pub fn new(store: Arc<dyn SettingsStore>, key: impl Into<String>) -> Self {
        Self {
            mode: RwLock::new(RepeatMode::Off),
            store,
            key: key.into(),
        }
    }

    /// Read the persisted mode. Missing, unrecognized or unreadable values
    /// all load as `Off`.
    pub async fn load(&self) -> RepeatMode {
        let mode = match self.store.get_string(&self.key).await {
            Ok(Some(value)) => RepeatMode::parse(&value),
            Ok(None) => RepeatMode::Off,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read repeat mode, using off");
                RepeatMode::Off
            }
        };

        *self.mode.write() = mode;
        debug!(mode = %mode, "Loaded repeat mode");
        mode
    }

    pub fn get(&self) -> RepeatMode {
        *self.mode.read()
    }

    /// Set and persist the mode.
    pub async fn set(&self, mode: RepeatMode) -> RepeatMode {
        *self.mode.write() = mode;
        self.persist(mode).await;
        mode
    }

    /// Advance off → all → one → off, persist, and return the new mode.
    pub async fn cycle(&self) -> RepeatMode {
        let mode = {
            let mut current = self.mode.write();
            *current = current.next();
            *current
        };
        self.persist(mode).await;
        mode
    }

    async fn persist(&self, mode: RepeatMode) {
        if let Err(e) = self.store.set_string(&self.key, mode.as_str()).await {
            warn!(key = %self.key, mode = %mode, error = %e, "Failed to persist repeat mode");
        }
    }
}
