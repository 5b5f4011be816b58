//! # Core Configuration Module
//!
//! Collects the host bridges the playback core runs against.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! holding every bridge implementation plus feature flags. The builder fails
//! fast when a required capability is missing, with a message that says what
//! to inject on each host family.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - durable repeat-mode preference
//!
//! ## Optional Dependencies
//!
//! - `HttpClient` - fetches media bytes for waveform analysis; without it every
//!   waveform is the seeded fallback
//! - `FrameBridge` - silences an embedded secondary frame
//! - `MediaSessionBridge` - OS now-playing metadata and transport keys
//! - `SurfaceScanner` - implicit (in-context) queue construction
//! - `LoggerSink` - forwards core logs into the host pipeline
//! - `Clock` - defaults to [`SystemClock`]
//!
//! When the `desktop-shims` feature is enabled, a SQLite `SettingsStore` under
//! `data_dir` and a reqwest `HttpClient` are injected if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .settings_store(Arc::new(MySettingsStore))
//!     .surface_scanner(Arc::new(MyScanner))
//!     .enable_waveform_analysis(true)
//!     .http_client(Arc::new(MyHttpClient))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Media session enabled without a MediaSessionBridge
//! let config = CoreConfig::builder()
//!     .enable_media_session(true)
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    Clock, FrameBridge, HttpClient, LoggerSink, MediaSessionBridge, SettingsStore,
    SurfaceScanner, SystemClock,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Core configuration for the playback engine.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Directory for durable state (desktop default settings database)
    pub data_dir: Option<PathBuf>,

    /// User preferences storage (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Byte fetches for waveform analysis (optional)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Embedded secondary frame (optional)
    pub frame_bridge: Option<Arc<dyn FrameBridge>>,

    /// OS media session (optional)
    pub media_session: Option<Arc<dyn MediaSessionBridge>>,

    /// Render context scanner for implicit queues (optional)
    pub surface_scanner: Option<Arc<dyn SurfaceScanner>>,

    /// Host log forwarding (optional)
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    /// Time source
    pub clock: Arc<dyn Clock>,

    /// Feature flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("data_dir", &self.data_dir)
            .field("settings_store", &"SettingsStore { ... }")
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "frame_bridge",
                &self.frame_bridge.as_ref().map(|_| "FrameBridge { ... }"),
            )
            .field(
                "media_session",
                &self
                    .media_session
                    .as_ref()
                    .map(|_| "MediaSessionBridge { ... }"),
            )
            .field(
                "surface_scanner",
                &self
                    .surface_scanner
                    .as_ref()
                    .map(|_| "SurfaceScanner { ... }"),
            )
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
///
/// A flag that needs a bridge is rejected at build time when the bridge is
/// missing, rather than silently doing nothing at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Decode real waveforms (requires HttpClient)
    pub enable_waveform_analysis: bool,

    /// Publish now-playing metadata to the OS (requires MediaSessionBridge)
    pub enable_media_session: bool,

    /// Build queues from the surrounding render context (requires SurfaceScanner)
    pub enable_implicit_queues: bool,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates feature flags against the bridges that are present.
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.data_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config("Data directory cannot be empty".to_string()));
            }
        }

        if self.features.enable_waveform_analysis && self.http_client.is_none() {
            return Err(Error::CapabilityMissing {
                capability: "HttpClient".to_string(),
                message: "Waveform analysis enabled but no HttpClient provided. \
                          Disable the feature or inject an HttpClient implementation."
                    .to_string(),
            });
        }

        if self.features.enable_media_session && self.media_session.is_none() {
            return Err(Error::CapabilityMissing {
                capability: "MediaSessionBridge".to_string(),
                message: "Media session enabled but no MediaSessionBridge provided. \
                          Disable the feature or inject a MediaSessionBridge implementation."
                    .to_string(),
            });
        }

        if self.features.enable_implicit_queues && self.surface_scanner.is_none() {
            return Err(Error::CapabilityMissing {
                capability: "SurfaceScanner".to_string(),
                message: "Implicit queues enabled but no SurfaceScanner provided. \
                          Disable the feature or inject a SurfaceScanner implementation."
                    .to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required to persist the repeat mode. \
                 Desktop: enable the 'desktop-shims' feature and set a data_dir to use the default SqliteSettingsStore. \
                 Mobile: inject platform-native settings (UserDefaults/DataStore). \
                 Web: inject a localStorage-based settings store."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(data_dir: Option<&Path>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::{MemorySettingsStore, SqliteSettingsStore};
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let Some(data_dir) = data_dir else {
        tracing::warn!("No data_dir configured; repeat mode will not survive a restart");
        let store: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::new());
        return Ok(store);
    };

    let path = data_dir.join("settings.db");

    let init_store = move || -> Result<SqliteSettingsStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default settings store: {}",
                    e
                ))
            })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    // block_on panics inside a runtime, so hop to a plain thread there
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(init_store).join().map_err(|_| {
            Error::Internal(
                "Worker thread panicked while creating default SettingsStore".to_string(),
            )
        })??,
        Err(_) => init_store()?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_data_dir: Option<&Path>) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Option<Arc<dyn HttpClient>>> {
    let client = bridge_desktop::ReqwestHttpClient::new()
        .map_err(|e| Error::Internal(format!("Failed to initialize default HttpClient: {}", e)))?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(Some(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Option<Arc<dyn HttpClient>>> {
    Ok(None)
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    data_dir: Option<PathBuf>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    http_client: Option<Arc<dyn HttpClient>>,
    frame_bridge: Option<Arc<dyn FrameBridge>>,
    media_session: Option<Arc<dyn MediaSessionBridge>>,
    surface_scanner: Option<Arc<dyn SurfaceScanner>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    clock: Option<Arc<dyn Clock>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the directory for durable state.
    ///
    /// Only consulted when no `SettingsStore` is injected and the
    /// `desktop-shims` feature provides the default.
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the settings store implementation (required).
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the HTTP client used to fetch media bytes for waveform analysis.
    ///
    /// If not provided and waveform analysis is enabled, the reqwest-based
    /// default is used when the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the bridge to an embedded secondary frame.
    pub fn frame_bridge(mut self, bridge: Arc<dyn FrameBridge>) -> Self {
        self.frame_bridge = Some(bridge);
        self
    }

    /// Sets the OS media session bridge.
    pub fn media_session(mut self, session: Arc<dyn MediaSessionBridge>) -> Self {
        self.media_session = Some(session);
        self
    }

    /// Sets the render context scanner used for implicit queues.
    pub fn surface_scanner(mut self, scanner: Arc<dyn SurfaceScanner>) -> Self {
        self.surface_scanner = Some(scanner);
        self
    }

    /// Sets a sink that mirrors core logs to the host.
    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Overrides the time source (tests).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Enables or disables real waveform decoding.
    ///
    /// Default: false
    pub fn enable_waveform_analysis(mut self, enabled: bool) -> Self {
        self.features.enable_waveform_analysis = enabled;
        self
    }

    /// Enables or disables OS media session integration.
    ///
    /// Default: false
    pub fn enable_media_session(mut self, enabled: bool) -> Self {
        self.features.enable_media_session = enabled;
        self
    }

    /// Enables or disables implicit (context-scanned) queues.
    ///
    /// Default: false
    pub fn enable_implicit_queues(mut self, enabled: bool) -> Self {
        self.features.enable_implicit_queues = enabled;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - `CapabilityMissing` when no `SettingsStore` can be provided
    /// - `CapabilityMissing` when a feature flag lacks its bridge
    /// - `Internal` when a desktop default fails to initialize
    pub fn build(self) -> Result<CoreConfig> {
        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.data_dir.as_deref())?,
        };

        let http_client = match self.http_client {
            Some(client) => Some(client),
            None if self.features.enable_waveform_analysis => provide_default_http_client()?,
            None => None,
        };

        let config = CoreConfig {
            data_dir: self.data_dir,
            settings_store,
            http_client,
            frame_bridge: self.frame_bridge,
            media_session: self.media_session,
            surface_scanner: self.surface_scanner,
            logger_sink: self.logger_sink,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
