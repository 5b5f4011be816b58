//! Test doubles shared by the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, FrameBridge, MediaAction, MediaMetadata, MediaSessionBridge, PlaybackResource,
    ResourceId, ResourceKind, ScannedSurface, SettingsStore, SurfaceScanner,
};
use core_playback::{EngineConfig, EngineDependencies, PlaybackEngine};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Playback resource
// ============================================================================

#[derive(Default)]
struct ResourceState {
    source_url: Option<String>,
    position: f64,
    duration: f64,
    playing: bool,
    visible: bool,
    proxy: Option<ResourceId>,
}

/// In-memory surface. `play()` can be delayed or rejected.
pub struct MockResource {
    id: ResourceId,
    kind: ResourceKind,
    state: Mutex<ResourceState>,
    play_delay: Mutex<Option<Duration>>,
    reject_play: AtomicBool,
    play_calls: AtomicUsize,
    /// Duration every loaded source reports.
    load_duration: Mutex<f64>,
}

impl MockResource {
    pub fn new(kind: ResourceKind) -> Arc<Self> {
        Arc::new(Self {
            id: ResourceId::new(),
            kind,
            state: Mutex::new(ResourceState {
                visible: true,
                ..Default::default()
            }),
            play_delay: Mutex::new(None),
            reject_play: AtomicBool::new(false),
            play_calls: AtomicUsize::new(0),
            load_duration: Mutex::new(180.0),
        })
    }

    pub fn background() -> Arc<Self> {
        Self::new(ResourceKind::Background)
    }

    /// An inline surface with its own source already attached.
    pub fn inline(kind: ResourceKind, source_url: &str, duration: f64) -> Arc<Self> {
        let resource = Self::new(kind);
        {
            let mut state = resource.state.lock();
            state.source_url = Some(source_url.to_string());
            state.duration = duration;
        }
        resource
    }

    pub fn set_play_delay(&self, delay: Duration) {
        *self.play_delay.lock() = Some(delay);
    }

    pub fn set_reject_play(&self, reject: bool) {
        self.reject_play.store(reject, Ordering::SeqCst);
    }

    pub fn set_position(&self, position: f64) {
        self.state.lock().position = position;
    }

    pub fn set_duration(&self, duration: f64) {
        self.state.lock().duration = duration;
    }

    pub fn set_load_duration(&self, duration: f64) {
        *self.load_duration.lock() = duration;
    }

    /// Simulate the media reaching its end on its own.
    pub fn finish(&self) {
        let mut state = self.state.lock();
        state.position = state.duration;
        state.playing = false;
    }

    /// Simulate the user pressing the surface's native play button.
    pub fn force_playing(&self) {
        self.state.lock().playing = true;
    }

    pub fn visible(&self) -> bool {
        self.state.lock().visible
    }

    pub fn proxy(&self) -> Option<ResourceId> {
        self.state.lock().proxy
    }

    pub fn play_calls(&self) -> usize {
        self.play_calls.load(Ordering::SeqCst)
    }

    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn PlaybackResource> {
        self.clone()
    }
}

#[async_trait]
impl PlaybackResource for MockResource {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn source_url(&self) -> Option<String> {
        self.state.lock().source_url.clone()
    }

    fn position(&self) -> f64 {
        self.state.lock().position
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    async fn load(&self, source_url: &str) -> BridgeResult<()> {
        let duration = *self.load_duration.lock();
        let mut state = self.state.lock();
        state.source_url = Some(source_url.to_string());
        state.position = 0.0;
        state.duration = duration;
        state.playing = false;
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.play_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.reject_play.load(Ordering::SeqCst) {
            return Err(BridgeError::PlaybackRejected("autoplay blocked".to_string()));
        }

        self.state.lock().playing = true;
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.state.lock().playing = false;
        Ok(())
    }

    async fn seek(&self, position: f64) -> BridgeResult<()> {
        self.state.lock().position = position;
        Ok(())
    }

    async fn set_visible(&self, visible: bool) -> BridgeResult<()> {
        self.state.lock().visible = visible;
        Ok(())
    }

    fn set_visual_proxy(&self, proxy: Option<Arc<dyn PlaybackResource>>) {
        self.state.lock().proxy = proxy.map(|p| p.id());
    }
}

// ============================================================================
// Host bridges
// ============================================================================

#[derive(Default)]
pub struct MapStore {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SettingsStore for MapStore {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Returns a fixed list of surfaces regardless of the anchor.
pub struct FixedScanner {
    pub surfaces: Vec<ScannedSurface>,
}

impl SurfaceScanner for FixedScanner {
    fn scan_context(&self, _anchor: ResourceId) -> Vec<ScannedSurface> {
        self.surfaces.clone()
    }
}

#[derive(Default)]
pub struct RecordingSession {
    pub metadata: Mutex<Vec<MediaMetadata>>,
    pub states: Mutex<Vec<bool>>,
}

#[async_trait]
impl MediaSessionBridge for RecordingSession {
    async fn set_metadata(&self, metadata: MediaMetadata) -> BridgeResult<()> {
        self.metadata.lock().push(metadata);
        Ok(())
    }

    async fn set_playback_state(&self, playing: bool) -> BridgeResult<()> {
        self.states.lock().push(playing);
        Ok(())
    }

    async fn set_supported_actions(&self, _actions: &[MediaAction]) -> BridgeResult<()> {
        Ok(())
    }
}

/// Records every silence request. When `mounted` is false it answers like a
/// host with no frame on the page.
pub struct RecordingFrame {
    pub calls: Mutex<Vec<Option<String>>>,
    mounted: bool,
}

impl RecordingFrame {
    pub fn mounted() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            mounted: true,
        })
    }

    pub fn absent() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            mounted: false,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl FrameBridge for RecordingFrame {
    async fn silence_except(&self, token: Option<&str>) -> BridgeResult<()> {
        self.calls.lock().push(token.map(str::to_string));
        if self.mounted {
            Ok(())
        } else {
            Err(BridgeError::NotAvailable("no embedded frame".to_string()))
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

pub fn test_config() -> EngineConfig {
    EngineConfig {
        prefetch_waveforms: false,
        ..Default::default()
    }
}

pub fn engine_with(
    background: &Arc<MockResource>,
    configure: impl FnOnce(EngineDependencies) -> EngineDependencies,
) -> Arc<PlaybackEngine> {
    let deps = configure(EngineDependencies::new(Arc::new(MapStore::default())).with_decoder(None));
    Arc::new(
        PlaybackEngine::new(test_config(), background.as_dyn(), deps)
            .expect("default test config is valid"),
    )
}

pub fn engine(background: &Arc<MockResource>) -> Arc<PlaybackEngine> {
    engine_with(background, |deps| deps)
}

pub fn url(name: &str) -> String {
    format!("https://cdn.example.com/{}.mp3", name)
}
