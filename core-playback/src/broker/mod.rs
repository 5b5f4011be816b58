//! # Playback Ownership Broker
//!
//! `PlaybackEngine` guarantees that exactly one playback resource is audible
//! at a time across every surface the host renders.
//!
//! ## Overview
//!
//! - **Audio** activations are handed off to the single long-lived background
//!   resource: source and position are copied over, the inline surface is
//!   paused and hidden, and its visuals are proxied to the background so they
//!   keep tracking playback.
//! - **Video** activations stay inline. The background is paused and, if it
//!   was carrying audio, snapshotted so the audio resumes when the video ends.
//! - Only the **authoritative** resource's events are honoured. Events from
//!   anything else are stale and ignored.
//!
//! ```text
//!   activate(inline audio) ──> background.load/seek/play   (authority: background)
//!   activate(inline video) ──> background.pause + snapshot (authority: video)
//!   video Ended            ──> restore snapshot            (authority: background)
//! ```
//!
//! ## Ordering
//!
//! Every activation takes a new generation number under the state lock. The
//! lock is released before awaiting `play()`, which may be slow or rejected;
//! when it resolves, a resource that was superseded meanwhile and is no
//! longer authoritative is paused again. The most recent activation wins.
//!
//! ## Failure policy
//!
//! Rejected `play()` calls, failing resource controls, an absent frame or
//! media session, and waveform failures are logged and swallowed. Invalid
//! requests (empty source, index out of range) are ignored without touching
//! state.

mod request;
mod state;

pub use request::{ActivationRequest, ExternalTrack, QueueContext};
pub use state::InterruptedState;

use self::state::{Authority, EngineState};
use crate::config::EngineConfig;
use crate::decoder::{default_decoder, PcmDecoder};
use crate::error::Result;
use crate::format::secs_to_millis;
use crate::now_playing::NowPlaying;
use crate::queue::{decide_on_ended, EndAction, Queue};
use crate::repeat::{RepeatController, RepeatMode};
use crate::resume::ResumeStore;
use crate::track::Track;
use crate::waveform::{BarStyle, WaveformService};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    Clock, FrameBridge, HttpClient, MediaAction, MediaSessionBridge, PlaybackResource,
    ResourceEvent, ResourceId, ResourceKind, SettingsStore, SurfaceScanner, SystemClock,
};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, QueueEvent, WaveformEvent};
use core_runtime::logging::strip_path;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

/// Collaborators the engine is built from.
///
/// Only the settings store is required; everything else has a default or is
/// optional.
pub struct EngineDependencies {
    pub settings: Arc<dyn SettingsStore>,
    pub clock: Arc<dyn Clock>,
    pub event_bus: EventBus,
    pub http_client: Option<Arc<dyn HttpClient>>,
    pub decoder: Option<Arc<dyn PcmDecoder>>,
    pub frame_bridge: Option<Arc<dyn FrameBridge>>,
    pub media_session: Option<Arc<dyn MediaSessionBridge>>,
    pub surface_scanner: Option<Arc<dyn SurfaceScanner>>,
}

impl EngineDependencies {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            clock: Arc::new(SystemClock),
            event_bus: EventBus::default(),
            http_client: None,
            decoder: default_decoder(),
            frame_bridge: None,
            media_session: None,
            surface_scanner: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_decoder(mut self, decoder: Option<Arc<dyn PcmDecoder>>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_frame_bridge(mut self, bridge: Arc<dyn FrameBridge>) -> Self {
        self.frame_bridge = Some(bridge);
        self
    }

    pub fn with_media_session(mut self, session: Arc<dyn MediaSessionBridge>) -> Self {
        self.media_session = Some(session);
        self
    }

    pub fn with_surface_scanner(mut self, scanner: Arc<dyn SurfaceScanner>) -> Self {
        self.surface_scanner = Some(scanner);
        self
    }
}

/// The playback broker. One per session; share it behind an `Arc`.
pub struct PlaybackEngine {
    config: EngineConfig,
    background: Arc<dyn PlaybackResource>,
    state: Arc<Mutex<EngineState>>,
    surfaces: RwLock<HashMap<ResourceId, Arc<dyn PlaybackResource>>>,
    now_playing: Arc<RwLock<NowPlaying>>,
    resume: Arc<ResumeStore>,
    repeat: Arc<RepeatController>,
    waveforms: Arc<WaveformService>,
    event_bus: EventBus,
    frame_bridge: Option<Arc<dyn FrameBridge>>,
    media_session: Option<Arc<dyn MediaSessionBridge>>,
    surface_scanner: Option<Arc<dyn SurfaceScanner>>,
    sampler: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackEngine {
    /// Build an engine around the host's background audio resource.
    ///
    /// The repeat mode starts as `off`; call [`load_repeat_mode`](Self::load_repeat_mode)
    /// to restore the persisted value.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `config` fails validation.
    pub fn new(
        config: EngineConfig,
        background: Arc<dyn PlaybackResource>,
        deps: EngineDependencies,
    ) -> Result<Self> {
        config.validate()?;

        if background.kind() != ResourceKind::Background {
            warn!(kind = ?background.kind(), "Background resource has an unexpected kind");
        }

        let resume = Arc::new(ResumeStore::new(
            deps.clock.clone(),
            config.finished_threshold_secs,
            config.min_resume_secs,
        ));
        let repeat = Arc::new(RepeatController::new(
            deps.settings.clone(),
            config.repeat_storage_key.clone(),
        ));
        let style = BarStyle {
            min_height: config.min_bar_height,
            max_height: config.max_bar_height,
            silence_epsilon: config.silence_epsilon,
        };
        let waveforms = Arc::new(WaveformService::new(
            deps.http_client,
            deps.decoder,
            style,
            config.fetch_timeout,
        ));

        Ok(Self {
            config,
            background,
            state: Arc::new(Mutex::new(EngineState::default())),
            surfaces: RwLock::new(HashMap::new()),
            now_playing: Arc::new(RwLock::new(NowPlaying::default())),
            resume,
            repeat,
            waveforms,
            event_bus: deps.event_bus,
            frame_bridge: deps.frame_bridge,
            media_session: deps.media_session,
            surface_scanner: deps.surface_scanner,
            sampler: parking_lot::Mutex::new(None),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn resume_store(&self) -> &ResumeStore {
        &self.resume
    }

    pub fn waveforms(&self) -> &Arc<WaveformService> {
        &self.waveforms
    }

    pub fn background(&self) -> &Arc<dyn PlaybackResource> {
        &self.background
    }

    pub fn now_playing(&self) -> NowPlaying {
        self.now_playing.read().clone()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat.get()
    }

    pub async fn queue(&self) -> Queue {
        self.state.lock().await.queue.clone()
    }

    pub async fn current_track(&self) -> Option<Track> {
        self.state.lock().await.track.clone()
    }

    pub async fn interrupted(&self) -> Option<InterruptedState> {
        self.state.lock().await.interrupted.clone()
    }

    /// Identity of the resource whose events are currently honoured.
    pub async fn authoritative_id(&self) -> Option<ResourceId> {
        self.state.lock().await.authority.as_ref().map(|a| a.resource.id())
    }

    // ========================================================================
    // Repeat
    // ========================================================================

    pub async fn load_repeat_mode(&self) -> RepeatMode {
        self.repeat.load().await
    }

    pub async fn set_repeat_mode(&self, mode: RepeatMode) -> RepeatMode {
        let mode = self.repeat.set(mode).await;
        self.announce_repeat(mode);
        mode
    }

    /// off → all → one → off
    pub async fn cycle_repeat_mode(&self) -> RepeatMode {
        let mode = self.repeat.cycle().await;
        self.announce_repeat(mode);
        mode
    }

    fn announce_repeat(&self, mode: RepeatMode) {
        info!(mode = %mode, "Repeat mode changed");
        self.emit(CoreEvent::Queue(QueueEvent::RepeatModeChanged {
            mode: mode.as_str().to_string(),
        }));
    }

    // ========================================================================
    // Surfaces
    // ========================================================================

    /// Make a surface known, so later activations can silence it.
    pub fn register_surface(&self, resource: Arc<dyn PlaybackResource>) {
        let id = resource.id();
        if self.surfaces.write().insert(id, resource).is_none() {
            debug!(resource = %id, "Registered surface");
        }
    }

    /// Forget a surface that is no longer rendered.
    ///
    /// If it was the inline origin of background audio, the background keeps
    /// playing; only the visual link is dropped.
    pub async fn unregister_surface(&self, id: ResourceId) {
        self.surfaces.write().remove(&id);

        let mut state = self.state.lock().await;

        if let Some(authority) = state.authority.as_mut() {
            if authority.has_origin(id) {
                authority.origin = None;
                debug!(resource = %id, "Origin surface went away, background keeps playing");
            } else if authority.is(id) {
                state.authority = None;
                self.now_playing.write().playing = false;
                debug!(resource = %id, "Authoritative surface went away");
            }
        }

        if let Some(interrupted) = state.interrupted.as_mut() {
            if interrupted.origin == Some(id) {
                interrupted.origin = None;
            }
        }
    }

    fn surface(&self, id: ResourceId) -> Option<Arc<dyn PlaybackResource>> {
        self.surfaces.read().get(&id).cloned()
    }

    // ========================================================================
    // Activation
    // ========================================================================

    /// Make the requested resource the sole active source.
    #[instrument(skip(self))]
    pub async fn activate(&self, request: ActivationRequest) -> Result<()> {
        match request {
            ActivationRequest::Surface {
                resource,
                track,
                context,
            } => self.activate_surface(resource, track, context).await,
            ActivationRequest::Playlist {
                tracks,
                start_index,
            } => self.activate_playlist(tracks, start_index).await,
        }
    }

    async fn activate_surface(
        &self,
        resource: Arc<dyn PlaybackResource>,
        track: Track,
        context: QueueContext,
    ) -> Result<()> {
        if track.source_url.trim().is_empty() {
            debug!("Ignoring activation without a source URL");
            return Ok(());
        }

        self.register_surface(resource.clone());
        let queue = self.build_queue(&resource, &track, context);

        let mut state = self.state.lock().await;
        let generation = state.next_generation();
        state.external = false;

        self.silence_others(&[resource.id()]).await;

        let target = match resource.kind() {
            ResourceKind::InlineVideo => self.promote_video(&mut state, resource, track).await,
            kind => {
                let inline_position = resource.position();
                let start = if inline_position.is_finite()
                    && inline_position > self.config.min_resume_secs
                {
                    inline_position
                } else {
                    self.resume.resume_time(&track.source_url)
                };
                let origin = (kind == ResourceKind::InlineAudio).then_some(resource);
                self.promote_audio(&mut state, track, origin, start).await
            }
        };

        state.queue = queue;
        self.announce_activation(&state, generation);
        drop(state);

        self.publish_metadata().await;
        self.start(target, generation).await;
        Ok(())
    }

    async fn activate_playlist(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        let Some(queue) = Queue::explicit(tracks, start_index) else {
            debug!(start_index, "Ignoring playlist activation with no playable start");
            return Ok(());
        };

        let mut state = self.state.lock().await;
        let generation = state.next_generation();
        state.external = false;

        self.silence_others(&[]).await;

        state.queue = queue;
        let Some(target) = self.play_entry(&mut state, start_index, false).await else {
            return Ok(());
        };

        self.announce_activation(&state, generation);
        drop(state);

        self.publish_metadata().await;
        self.start(target, generation).await;
        Ok(())
    }

    /// Play `queue[index]`. Out-of-range indices are ignored.
    ///
    /// Unless `restart` is set, playback resumes from the remembered position
    /// of that track, or from the start if it was basically finished.
    #[instrument(skip(self))]
    pub async fn play_at(&self, index: usize, restart: bool) -> Result<()> {
        let mut state = self.state.lock().await;

        if index >= state.queue.len() {
            debug!(index, len = state.queue.len(), "Ignoring play_at outside the queue");
            return Ok(());
        }

        let generation = state.next_generation();
        state.external = false;
        let from = state.queue.current_index();

        self.silence_others(&[]).await;

        let Some(target) = self.play_entry(&mut state, index, restart).await else {
            return Ok(());
        };

        self.emit(CoreEvent::Queue(QueueEvent::Advanced {
            from_index: from.unwrap_or(index) as u32,
            to_index: index as u32,
            restarted: restart,
        }));
        self.announce_activation(&state, generation);
        drop(state);

        self.publish_metadata().await;
        self.start(target, generation).await;
        Ok(())
    }

    fn build_queue(
        &self,
        resource: &Arc<dyn PlaybackResource>,
        track: &Track,
        context: QueueContext,
    ) -> Queue {
        let QueueContext::InContext { defaults } = context else {
            return Queue::empty();
        };

        let Some(scanner) = &self.surface_scanner else {
            debug!("No surface scanner, playing without a queue");
            return Queue::empty();
        };

        let scanned = scanner.scan_context(resource.id());
        match Queue::implicit(&scanned, resource.id(), &defaults) {
            Some(queue) => queue,
            None => {
                debug!(
                    source = %strip_path(&track.source_url),
                    scanned = scanned.len(),
                    "Activated surface not found in its context, playing without a queue"
                );
                Queue::empty()
            }
        }
    }

    /// Point the engine at queue entry `index` and return what to start.
    async fn play_entry(
        &self,
        state: &mut EngineState,
        index: usize,
        restart: bool,
    ) -> Option<Arc<dyn PlaybackResource>> {
        let entry = state.queue.get(index).cloned()?;
        state.queue.set_current(index);

        let surface = entry.surface.and_then(|id| self.surface(id));

        match surface {
            Some(video) if video.kind().is_video() => {
                if restart {
                    swallow("seek", video.seek(0.0).await);
                }
                Some(self.promote_video(state, video, entry.track).await)
            }
            surface => {
                let start = if restart {
                    0.0
                } else {
                    self.resume.resume_time(&entry.track.source_url)
                };
                let origin = surface.filter(|s| s.kind() == ResourceKind::InlineAudio);
                Some(self.promote_audio(state, entry.track, origin, start).await)
            }
        }
    }

    /// Hand audio to the background resource.
    async fn promote_audio(
        &self,
        state: &mut EngineState,
        track: Track,
        origin: Option<Arc<dyn PlaybackResource>>,
        start: f64,
    ) -> Arc<dyn PlaybackResource> {
        let background = self.background.clone();
        let new_origin = origin.as_ref().map(|o| o.id());
        self.release_origin(state, new_origin).await;

        match background.source_url() {
            Some(current) if current == track.source_url => {}
            current => {
                if let Some(current) = current.filter(|_| state.is_authoritative(background.id())) {
                    self.resume
                        .remember(&current, background.position(), background.duration());
                }
                swallow("load", background.load(&track.source_url).await);
            }
        }
        swallow("seek", background.seek(start).await);

        if let Some(origin) = &origin {
            swallow("pause", origin.pause().await);
            swallow("set_visible", origin.set_visible(false).await);
            origin.set_visual_proxy(Some(background.clone()));
        }

        debug!(
            source = %strip_path(&track.source_url),
            start,
            "Audio handed to background resource"
        );

        if self.config.prefetch_waveforms {
            self.prefetch_waveform(&track);
        }

        state.interrupted = None;
        state.authority = Some(Authority {
            resource: background.clone(),
            origin,
        });
        state.track = Some(track);

        background
    }

    /// Let a video play inline, snapshotting background audio if it was the
    /// active source.
    async fn promote_video(
        &self,
        state: &mut EngineState,
        video: Arc<dyn PlaybackResource>,
        track: Track,
    ) -> Arc<dyn PlaybackResource> {
        let background = self.background.clone();
        let previous_was_video = state
            .authority
            .as_ref()
            .is_some_and(|a| a.resource.kind().is_video());
        let background_was_active = state.is_authoritative(background.id());

        if !previous_was_video && background_was_active {
            if let Some(source_url) = background.source_url().filter(|s| !s.is_empty()) {
                let position = background.position();
                let snapshot_track = state
                    .track
                    .clone()
                    .unwrap_or_else(|| Track::new(source_url.clone(), "Untitled", ""));

                self.resume
                    .remember(&source_url, position, background.duration());
                self.emit(CoreEvent::Playback(PlaybackEvent::Interrupted {
                    source_url: source_url.clone(),
                    position_ms: secs_to_millis(position),
                }));
                info!(source = %strip_path(&source_url), position, "Audio interrupted by video");

                state.interrupted = Some(InterruptedState {
                    source_url,
                    position_secs: position,
                    resource: background.id(),
                    origin: state
                        .authority
                        .as_ref()
                        .and_then(|a| a.origin.as_ref().map(|o| o.id())),
                    track: snapshot_track,
                    queue: state.queue.clone(),
                });
            }
        }

        if background.is_playing() {
            swallow("pause", background.pause().await);
        }
        self.release_origin(state, None).await;

        state.authority = Some(Authority {
            resource: video.clone(),
            origin: None,
        });
        state.track = Some(track);

        video
    }

    /// Detach the current inline origin unless it is `keep`.
    async fn release_origin(&self, state: &mut EngineState, keep: Option<ResourceId>) {
        let Some(authority) = state.authority.as_mut() else {
            return;
        };

        if let Some(origin) = authority.origin.take() {
            if Some(origin.id()) == keep {
                authority.origin = Some(origin);
                return;
            }
            origin.set_visual_proxy(None);
            swallow("set_visible", origin.set_visible(true).await);
        }
    }

    /// Pause every playing surface except `keep` and ask the embedded frame
    /// to go quiet. The background resource is handled by the caller.
    async fn silence_others(&self, keep: &[ResourceId]) {
        let others: Vec<Arc<dyn PlaybackResource>> = self
            .surfaces
            .read()
            .values()
            .filter(|s| s.id() != self.background.id() && !keep.contains(&s.id()))
            .cloned()
            .collect();

        for surface in others {
            if surface.is_playing() {
                debug!(resource = %surface.id(), "Silencing surface");
                swallow("pause", surface.pause().await);
            }
        }

        if let Some(frame) = &self.frame_bridge {
            if let Err(e) = frame.silence_except(None).await {
                debug!(error = %e, "Embedded frame not silenced");
            }
        }
    }

    /// Await `play()` outside the state lock and reconcile afterwards.
    async fn start(&self, target: Arc<dyn PlaybackResource>, generation: u64) {
        let source_url = target.source_url().unwrap_or_default();

        match target.play().await {
            Ok(()) => {
                let state = self.state.lock().await;
                let current = state.generation == generation;
                let authoritative = state.is_authoritative(target.id());

                if !current && (!authoritative || state.external) {
                    drop(state);
                    debug!(
                        resource = %target.id(),
                        generation,
                        "Superseded activation started late, pausing it"
                    );
                    swallow("pause", target.pause().await);
                    return;
                }

                let title = state
                    .track
                    .as_ref()
                    .map(|t| t.title.clone())
                    .unwrap_or_default();
                drop(state);

                self.now_playing.write().playing = true;
                self.emit(CoreEvent::Playback(PlaybackEvent::Started {
                    source_url,
                    title,
                }));
                self.publish_playback_state(true).await;
                self.ensure_sampler();
            }
            Err(e) => {
                let state = self.state.lock().await;
                let current = state.generation == generation;
                let authoritative = state.is_authoritative(target.id());
                let stale = !current && (!authoritative || state.external);
                drop(state);

                if stale {
                    debug!(
                        resource = %target.id(),
                        generation,
                        error = %e,
                        "Superseded activation rejected, ignoring"
                    );
                    return;
                }

                warn!(
                    source = %strip_path(&source_url),
                    error = %e,
                    "Playback rejected"
                );
                self.now_playing.write().playing = false;
                self.emit(CoreEvent::Playback(PlaybackEvent::Rejected {
                    source_url,
                    message: e.to_string(),
                }));
            }
        }
    }

    fn announce_activation(&self, state: &EngineState, generation: u64) {
        let Some(authority) = &state.authority else {
            return;
        };

        let resource = &authority.resource;
        let source_url = resource.source_url().unwrap_or_else(|| {
            state
                .track
                .as_ref()
                .map(|t| t.source_url.clone())
                .unwrap_or_default()
        });

        {
            let mut now = self.now_playing.write();
            *now = state
                .track
                .as_ref()
                .map(NowPlaying::for_track)
                .unwrap_or_default();
            now.set_progress(resource.position(), resource.duration());
        }

        info!(
            source = %strip_path(&source_url),
            kind = kind_name(resource.kind()),
            generation,
            "Activated playback resource"
        );

        self.emit(CoreEvent::Playback(PlaybackEvent::Activated {
            source_url,
            kind: kind_name(resource.kind()).to_string(),
            generation,
        }));

        if let Some(current_index) = state.queue.current_index() {
            self.emit(CoreEvent::Queue(QueueEvent::Replaced {
                mode: state.queue.mode().as_str().to_string(),
                length: state.queue.len() as u32,
                current_index: current_index as u32,
            }));
        }
    }

    // ========================================================================
    // Resource events
    // ========================================================================

    /// Feed a notification from a surface into the engine.
    ///
    /// Anything not coming from the authoritative resource is ignored.
    #[instrument(skip(self), level = "debug")]
    pub async fn handle_resource_event(&self, id: ResourceId, event: ResourceEvent) -> Result<()> {
        let state = self.state.lock().await;

        let Some(resource) = state.authoritative() else {
            return Ok(());
        };
        if resource.id() != id {
            debug!(resource = %id, ?event, "Ignoring event from non-authoritative resource");
            return Ok(());
        }

        let source_url = resource.source_url().unwrap_or_default();

        match event {
            ResourceEvent::Play => {
                drop(state);
                self.now_playing.write().playing = true;
                self.publish_playback_state(true).await;
            }
            ResourceEvent::Pause => {
                drop(state);
                let position = resource.position();
                self.resume
                    .remember(&source_url, position, resource.duration());
                {
                    let mut now = self.now_playing.write();
                    now.playing = false;
                    now.set_progress(position, resource.duration());
                }
                self.emit(CoreEvent::Playback(PlaybackEvent::Paused {
                    source_url,
                    position_ms: secs_to_millis(position),
                }));
                self.publish_playback_state(false).await;
            }
            ResourceEvent::TimeUpdate => {
                drop(state);
                record_progress(&self.resume, &self.now_playing, &self.event_bus, &resource);
            }
            ResourceEvent::Ended => {
                let duration = resource.duration();
                self.resume.remember(&source_url, duration, duration);
                self.emit(CoreEvent::Playback(PlaybackEvent::Ended {
                    source_url: source_url.clone(),
                }));

                let action = decide_on_ended(
                    resource.kind(),
                    state.interrupted.is_some(),
                    &state.queue,
                    self.repeat.get(),
                );
                debug!(?action, "Natural end");

                self.apply_end_action(state, resource, action).await;
            }
        }

        Ok(())
    }

    async fn apply_end_action(
        &self,
        mut state: tokio::sync::MutexGuard<'_, EngineState>,
        ended: Arc<dyn PlaybackResource>,
        action: EndAction,
    ) {
        match action {
            EndAction::ResumeInterrupted => {
                let Some(snapshot) = state.interrupted.take() else {
                    return;
                };
                let generation = state.next_generation();
                let origin = snapshot.origin.and_then(|id| self.surface(id));
                let position = snapshot.position_secs;
                let source_url = snapshot.source_url.clone();

                let target = self
                    .promote_audio(&mut state, snapshot.track, origin, position)
                    .await;
                state.queue = snapshot.queue;

                self.emit(CoreEvent::Playback(PlaybackEvent::InterruptResumed {
                    source_url: source_url.clone(),
                    position_ms: secs_to_millis(position),
                }));
                info!(source = %strip_path(&source_url), position, "Resuming interrupted audio");

                self.announce_activation(&state, generation);
                drop(state);

                self.publish_metadata().await;
                self.start(target, generation).await;
            }
            EndAction::PlayAt { index, restart } => {
                let generation = state.next_generation();
                let from = state.queue.current_index().unwrap_or(index);

                let Some(target) = self.play_entry(&mut state, index, restart).await else {
                    return;
                };

                self.emit(CoreEvent::Queue(QueueEvent::Advanced {
                    from_index: from as u32,
                    to_index: index as u32,
                    restarted: restart,
                }));
                self.announce_activation(&state, generation);
                drop(state);

                self.publish_metadata().await;
                self.start(target, generation).await;
            }
            EndAction::RestartLone => {
                let generation = state.generation;
                drop(state);

                swallow("seek", ended.seek(0.0).await);
                self.start(ended, generation).await;
            }
            EndAction::Stop => {
                let last_index = state.queue.current_index().unwrap_or(0);
                drop(state);

                self.now_playing.write().playing = false;
                self.emit(CoreEvent::Queue(QueueEvent::Exhausted {
                    last_index: last_index as u32,
                }));
                self.publish_playback_state(false).await;
                info!(last_index, "Queue exhausted, playback stopped");
            }
        }
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub async fn toggle_play(&self) -> Result<()> {
        let playing = {
            let state = self.state.lock().await;
            state.authoritative().is_some_and(|r| r.is_playing())
        };

        if playing {
            self.pause().await
        } else {
            self.resume().await
        }
    }

    pub async fn pause(&self) -> Result<()> {
        let Some(resource) = self.state.lock().await.authoritative() else {
            return Ok(());
        };

        if let Some(source_url) = resource.source_url() {
            self.resume
                .remember(&source_url, resource.position(), resource.duration());
        }
        swallow("pause", resource.pause().await);
        self.now_playing.write().playing = false;
        self.publish_playback_state(false).await;
        Ok(())
    }

    /// Resume the authoritative resource, from the top if it already ended.
    pub async fn resume(&self) -> Result<()> {
        let (resource, generation) = {
            let mut state = self.state.lock().await;
            let Some(resource) = state.authoritative() else {
                return Ok(());
            };
            state.external = false;
            (resource, state.generation)
        };

        let duration = resource.duration();
        if duration > 0.0 && resource.position() >= duration - self.config.finished_threshold_secs
        {
            swallow("seek", resource.seek(0.0).await);
        }

        self.silence_others(&[resource.id()]).await;
        self.restore_now_playing().await;
        self.start(resource, generation).await;
        Ok(())
    }

    /// Seek to `percent` (0-100) of the duration. No-op while the duration
    /// is unknown.
    pub async fn seek_to_percent(&self, percent: f64) -> Result<()> {
        let Some(resource) = self.state.lock().await.authoritative() else {
            return Ok(());
        };

        let duration = resource.duration();
        if !(duration > 0.0) || !percent.is_finite() {
            return Ok(());
        }

        let target = duration * percent.clamp(0.0, 100.0) / 100.0;
        swallow("seek", resource.seek(target).await);
        self.now_playing.write().set_progress(target, duration);
        Ok(())
    }

    /// Seek relative to the current position, clamped to the track.
    pub async fn seek_by(&self, offset_secs: f64) -> Result<()> {
        let Some(resource) = self.state.lock().await.authoritative() else {
            return Ok(());
        };
        if !offset_secs.is_finite() {
            return Ok(());
        }

        let duration = resource.duration();
        let mut target = (resource.position() + offset_secs).max(0.0);
        if duration > 0.0 {
            target = target.min(duration);
        }

        swallow("seek", resource.seek(target).await);
        self.now_playing.write().set_progress(target, duration);
        Ok(())
    }

    /// Next queue entry; wraps to the first under `repeat=all`.
    pub async fn skip_next(&self) -> Result<()> {
        let next = self.state.lock().await.queue.next_index(self.repeat.get());

        match next {
            Some((index, restart)) => self.play_at(index, restart).await,
            None => {
                debug!("No next track");
                Ok(())
            }
        }
    }

    /// Restart the current track when past the restart threshold or at the
    /// head of the queue, otherwise go back one entry.
    pub async fn skip_previous(&self) -> Result<()> {
        let (resource, previous) = {
            let state = self.state.lock().await;
            (state.authoritative(), state.queue.previous_index())
        };

        let Some(resource) = resource else {
            return Ok(());
        };

        match previous {
            Some(index) if resource.position() <= self.config.restart_previous_after_secs => {
                self.play_at(index, true).await
            }
            _ => {
                swallow("seek", resource.seek(0.0).await);
                self.now_playing
                    .write()
                    .set_progress(0.0, resource.duration());
                Ok(())
            }
        }
    }

    /// Stop the authoritative resource, detach any proxy, clear timers.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.next_generation();

        if let Some(authority) = state.authority.take() {
            let resource = authority.resource;
            if let Some(source_url) = resource.source_url() {
                self.resume
                    .remember(&source_url, resource.position(), resource.duration());
            }
            swallow("pause", resource.pause().await);

            if let Some(origin) = authority.origin {
                origin.set_visual_proxy(None);
                swallow("set_visible", origin.set_visible(true).await);
            }
        }

        state.interrupted = None;
        state.queue = Queue::empty();
        state.track = None;
        state.external = false;
        drop(state);

        if let Some(handle) = self.sampler.lock().take() {
            handle.abort();
        }

        *self.now_playing.write() = NowPlaying::default();
        self.emit(CoreEvent::Playback(PlaybackEvent::Closed));
        self.publish_playback_state(false).await;
        info!("Playback closed");
        Ok(())
    }

    // ========================================================================
    // Cross-frame and OS integration
    // ========================================================================

    /// An embedded frame started playing something the engine does not own.
    ///
    /// The engine's own resource is paused and the external track is shown.
    pub async fn notify_external_now_playing(&self, track: ExternalTrack) -> Result<()> {
        let resource = {
            let mut state = self.state.lock().await;
            state.next_generation();
            state.external = true;
            state.authoritative()
        };

        if let Some(resource) = resource {
            if let Some(source_url) = resource.source_url() {
                self.resume
                    .remember(&source_url, resource.position(), resource.duration());
            }
            if resource.is_playing() {
                swallow("pause", resource.pause().await);
            }
        }

        *self.now_playing.write() = NowPlaying {
            source_url: None,
            title: track.title.clone(),
            byline: track.byline.clone(),
            cover_url: track.cover_url.clone(),
            playing: true,
            external: true,
            ..Default::default()
        };

        self.emit(CoreEvent::Playback(PlaybackEvent::ExternalNowPlaying {
            title: track.title,
            byline: track.byline,
        }));
        self.publish_metadata().await;
        self.publish_playback_state(true).await;
        Ok(())
    }

    /// Dispatch an OS media-control action.
    pub async fn handle_media_action(&self, action: MediaAction) -> Result<()> {
        debug!(?action, "Media action");
        match action {
            MediaAction::Play => self.resume().await,
            MediaAction::Pause => self.pause().await,
            MediaAction::SeekBackward => self.seek_by(-self.config.seek_step_secs).await,
            MediaAction::SeekForward => self.seek_by(self.config.seek_step_secs).await,
            MediaAction::NextTrack => self.skip_next().await,
            MediaAction::PreviousTrack => self.skip_previous().await,
        }
    }

    /// Actions `handle_media_action` understands.
    pub fn supported_media_actions() -> &'static [MediaAction] {
        &[
            MediaAction::Play,
            MediaAction::Pause,
            MediaAction::SeekBackward,
            MediaAction::SeekForward,
            MediaAction::NextTrack,
            MediaAction::PreviousTrack,
        ]
    }

    async fn publish_metadata(&self) {
        let Some(session) = &self.media_session else {
            return;
        };
        let metadata = self.now_playing.read().media_metadata();
        if let Err(e) = session.set_metadata(metadata).await {
            debug!(error = %e, "Media session metadata not updated");
        }
    }

    async fn publish_playback_state(&self, playing: bool) {
        let Some(session) = &self.media_session else {
            return;
        };
        if let Err(e) = session.set_playback_state(playing).await {
            debug!(error = %e, "Media session state not updated");
        }
    }

    /// After external playback, show the engine's own track again.
    async fn restore_now_playing(&self) {
        let (track, resource) = {
            let state = self.state.lock().await;
            (state.track.clone(), state.authoritative())
        };

        let needs_restore = self.now_playing.read().external;
        if !needs_restore {
            return;
        }

        if let (Some(track), Some(resource)) = (track, resource) {
            let mut now = NowPlaying::for_track(&track);
            now.set_progress(resource.position(), resource.duration());
            *self.now_playing.write() = now;
            self.publish_metadata().await;
        }
    }

    // ========================================================================
    // Background work
    // ========================================================================

    fn prefetch_waveform(&self, track: &Track) {
        let waveforms = self.waveforms.clone();
        let event_bus = self.event_bus.clone();
        let source_url = track.source_url.clone();
        let title = track.title.clone();
        let bucket_count = self.config.default_bucket_count;

        tokio::spawn(async move {
            let waveform = waveforms
                .heights_or_seeded(&source_url, &title, bucket_count)
                .await;

            let event = match waveform.fallback {
                None => WaveformEvent::Ready {
                    source_url,
                    bucket_count: bucket_count as u32,
                },
                Some(e) => WaveformEvent::Fallback {
                    source_url,
                    bucket_count: bucket_count as u32,
                    reason: e.to_string(),
                },
            };
            event_bus.emit(CoreEvent::Waveform(event)).ok();
        });
    }

    /// Start the periodic resume sampler if it isn't running.
    fn ensure_sampler(&self) {
        let mut slot = self.sampler.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let state: Weak<Mutex<EngineState>> = Arc::downgrade(&self.state);
        let resume = self.resume.clone();
        let now_playing = self.now_playing.clone();
        let event_bus = self.event_bus.clone();
        let period = self.config.progress_sample_interval;

        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let Some(state) = state.upgrade() else {
                    break;
                };
                let resource = state.lock().await.authoritative();

                if let Some(resource) = resource.filter(|r| r.is_playing()) {
                    record_progress(&resume, &now_playing, &event_bus, &resource);
                }
            }
        }));
    }

    fn emit(&self, event: CoreEvent) {
        self.event_bus.emit(event).ok();
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        if let Some(handle) = self.sampler.get_mut().take() {
            handle.abort();
        }
    }
}

/// Sample `resource` into the resume store and the now-playing snapshot.
fn record_progress(
    resume: &ResumeStore,
    now_playing: &RwLock<NowPlaying>,
    event_bus: &EventBus,
    resource: &Arc<dyn PlaybackResource>,
) {
    let Some(source_url) = resource.source_url() else {
        return;
    };

    let position = resource.position();
    let duration = resource.duration();
    resume.remember(&source_url, position, duration);

    let percent = {
        let mut now = now_playing.write();
        if now.external {
            return;
        }
        now.set_progress(position, duration);
        now.percent
    };

    event_bus
        .emit(CoreEvent::Playback(PlaybackEvent::Progress {
            source_url,
            position_ms: secs_to_millis(position),
            duration_ms: secs_to_millis(duration),
            percent,
        }))
        .ok();
}

fn swallow(action: &'static str, result: BridgeResult<()>) {
    if let Err(e) = result {
        warn!(action, error = %e, "Resource control call failed");
    }
}

fn kind_name(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::InlineAudio => "inline_audio",
        ResourceKind::InlineVideo => "inline_video",
        ResourceKind::Background => "background",
    }
}
