//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (settings, HTTP,
//! embedded frame, media session, surface scanner) into the playback core.
//! Desktop apps typically enable the `desktop-shims` feature, which lets
//! `core-runtime` fall back to the SQLite settings store and the reqwest HTTP
//! client from `bridge-desktop`.

pub mod error;

pub use error::{CoreError, Result};

use bridge_traits::PlaybackResource;
use core_playback::{EngineConfig, EngineDependencies, MiniPlayer, PlaybackEngine, RepeatMode};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus};
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tracing::{info, instrument, warn};

/// Primary façade exposed to host applications.
///
/// Owns the engine, the mini-player adapter and the event bus they share.
#[derive(Clone)]
pub struct PlaybackService {
    engine: Arc<PlaybackEngine>,
    mini_player: MiniPlayer,
    event_bus: EventBus,
    config: Arc<CoreConfig>,
}

impl PlaybackService {
    /// Start the service with default engine tunables.
    pub async fn start(config: CoreConfig, background: Arc<dyn PlaybackResource>) -> Result<Self> {
        Self::start_with(config, EngineConfig::default(), background).await
    }

    /// Start the service.
    ///
    /// Restores the persisted repeat mode and, when a media session is
    /// enabled, declares the transport actions the engine handles.
    ///
    /// # Errors
    ///
    /// `Playback(InvalidConfig)` if `engine_config` fails validation.
    #[instrument(skip_all)]
    pub async fn start_with(
        config: CoreConfig,
        engine_config: EngineConfig,
        background: Arc<dyn PlaybackResource>,
    ) -> Result<Self> {
        let event_bus = EventBus::default();
        let features = config.features;

        let mut deps = EngineDependencies::new(config.settings_store.clone())
            .with_clock(config.clock.clone())
            .with_event_bus(event_bus.clone());

        if features.enable_waveform_analysis {
            if let Some(http) = &config.http_client {
                deps = deps.with_http_client(http.clone());
            }
        }
        if let Some(frame) = &config.frame_bridge {
            deps = deps.with_frame_bridge(frame.clone());
        }
        let media_session = config
            .media_session
            .clone()
            .filter(|_| features.enable_media_session);
        if let Some(session) = &media_session {
            deps = deps.with_media_session(session.clone());
        }
        if features.enable_implicit_queues {
            if let Some(scanner) = &config.surface_scanner {
                deps = deps.with_surface_scanner(scanner.clone());
            }
        }

        let engine = Arc::new(PlaybackEngine::new(engine_config, background, deps)?);
        let repeat = engine.load_repeat_mode().await;

        if let Some(session) = &media_session {
            if let Err(e) = session
                .set_supported_actions(PlaybackEngine::supported_media_actions())
                .await
            {
                warn!(error = %e, "Failed to declare media session actions");
            }
        }

        info!(
            repeat = %repeat,
            waveform_analysis = features.enable_waveform_analysis,
            media_session = media_session.is_some(),
            implicit_queues = features.enable_implicit_queues,
            "Playback service started"
        );

        Ok(Self {
            mini_player: MiniPlayer::new(engine.clone()),
            engine,
            event_bus,
            config: Arc::new(config),
        })
    }

    pub fn engine(&self) -> &Arc<PlaybackEngine> {
        &self.engine
    }

    pub fn mini_player(&self) -> &MiniPlayer {
        &self.mini_player
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    /// New subscriber to engine events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.engine.repeat_mode()
    }

    /// Stop playback and release every surface.
    pub async fn shutdown(&self) -> Result<()> {
        self.engine.close().await?;
        info!("Playback service stopped");
        Ok(())
    }
}

/// Desktop preset: settings persisted under `data_dir`, and real waveforms
/// when the `http-fetch` feature is enabled.
///
/// # Errors
///
/// Whatever `CoreConfig::build` fails with, typically an unwritable
/// `data_dir`.
#[cfg(feature = "desktop-shims")]
pub fn desktop_config(data_dir: impl Into<std::path::PathBuf>) -> Result<CoreConfig> {
    let config = CoreConfig::builder()
        .data_dir(data_dir)
        .enable_waveform_analysis(cfg!(feature = "http-fetch"))
        .build()?;
    Ok(config)
}
