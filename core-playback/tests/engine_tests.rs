//! Broker behaviour against in-memory surfaces.
//!
//! This suite verifies:
//! - Audio handoff to the background resource and visual proxying
//! - At most one resource playing, including under racing activations
//! - Video interruption and resumption of background audio
//! - Queue advance under each repeat mode
//! - Transport, close, and external now-playing

mod common;

use bridge_traits::{
    MediaAction, PlaybackResource, ResourceEvent, ResourceKind, ScannedSurface, TrackDescriptor,
};
use common::{
    engine, engine_with, url, FixedScanner, MockResource, RecordingFrame, RecordingSession,
};
use core_playback::{
    ActivationRequest, ControlAction, ExternalTrack, MiniPlayer, QueueMode, RepeatMode, Track,
    TrackDefaults,
};
use core_runtime::events::{CoreEvent, PlaybackEvent, QueueEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

fn track(name: &str) -> Track {
    Track::new(url(name), format!("Track {}", name), "@dj")
}

fn playlist(n: usize) -> Vec<Track> {
    (0..n).map(|i| track(&i.to_string())).collect()
}

fn drain(rx: &mut Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn end_naturally(engine: &core_playback::PlaybackEngine, resource: &Arc<MockResource>) {
    resource.finish();
    engine
        .handle_resource_event(resource.id(), ResourceEvent::Ended)
        .await
        .unwrap();
}

// ============================================================================
// Activation and handoff
// ============================================================================

#[tokio::test]
async fn test_inline_audio_hands_off_to_background() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let inline = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 120.0);
    inline.force_playing();

    engine
        .activate(ActivationRequest::standalone(inline.as_dyn(), track("a")))
        .await
        .unwrap();

    assert_eq!(bg.source_url(), Some(url("a")));
    assert!(bg.is_playing());
    assert!(!inline.is_playing());
    assert!(!inline.visible());
    assert_eq!(inline.proxy(), Some(bg.id()));
    assert_eq!(engine.authoritative_id().await, Some(bg.id()));

    let now = engine.now_playing();
    assert_eq!(now.title, "Track a");
    assert!(now.playing);
}

#[tokio::test]
async fn test_activation_resumes_remembered_position() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    engine.resume_store().remember(&url("a"), 90.0, 180.0);
    engine.resume_store().remember(&url("b"), 178.9, 180.0);

    let a = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 180.0);
    engine
        .activate(ActivationRequest::standalone(a.as_dyn(), track("a")))
        .await
        .unwrap();
    assert_eq!(bg.position(), 90.0);

    let b = MockResource::inline(ResourceKind::InlineAudio, &url("b"), 180.0);
    engine
        .activate(ActivationRequest::standalone(b.as_dyn(), track("b")))
        .await
        .unwrap();
    assert_eq!(bg.position(), 0.0);
}

#[tokio::test]
async fn test_inline_position_wins_over_remembered() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    engine.resume_store().remember(&url("a"), 90.0, 180.0);

    let a = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 180.0);
    a.set_position(12.5);
    engine
        .activate(ActivationRequest::standalone(a.as_dyn(), track("a")))
        .await
        .unwrap();

    assert_eq!(bg.position(), 12.5);
}

#[tokio::test]
async fn test_switching_audio_restores_previous_origin() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let a = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 120.0);
    let b = MockResource::inline(ResourceKind::InlineAudio, &url("b"), 120.0);

    engine
        .activate(ActivationRequest::standalone(a.as_dyn(), track("a")))
        .await
        .unwrap();
    engine
        .activate(ActivationRequest::standalone(b.as_dyn(), track("b")))
        .await
        .unwrap();

    assert!(a.visible());
    assert_eq!(a.proxy(), None);
    assert!(!b.visible());
    assert_eq!(b.proxy(), Some(bg.id()));
    assert_eq!(bg.source_url(), Some(url("b")));
}

#[tokio::test]
async fn test_activation_silences_other_surfaces() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let video = MockResource::inline(ResourceKind::InlineVideo, &url("v"), 60.0);
    let audio = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 120.0);

    engine
        .activate(ActivationRequest::standalone(video.as_dyn(), track("v")))
        .await
        .unwrap();
    assert!(video.is_playing());

    engine
        .activate(ActivationRequest::standalone(audio.as_dyn(), track("a")))
        .await
        .unwrap();

    let playing: Vec<bool> = [&bg, &video, &audio].iter().map(|r| r.is_playing()).collect();
    assert_eq!(playing, vec![true, false, false]);
}

#[tokio::test]
async fn test_empty_source_is_ignored() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let inline = MockResource::new(ResourceKind::InlineAudio);

    engine
        .activate(ActivationRequest::standalone(
            inline.as_dyn(),
            Track::new("  ", "Nothing", ""),
        ))
        .await
        .unwrap();

    assert_eq!(engine.authoritative_id().await, None);
    assert_eq!(bg.play_calls(), 0);
    assert!(engine.now_playing().is_idle());
}

#[tokio::test]
async fn test_rejected_play_is_swallowed() {
    let bg = MockResource::background();
    bg.set_reject_play(true);
    let engine = engine(&bg);
    let mut rx = engine.events().subscribe();
    let a = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 120.0);

    engine
        .activate(ActivationRequest::standalone(a.as_dyn(), track("a")))
        .await
        .unwrap();

    assert!(!bg.is_playing());
    assert!(!engine.now_playing().playing);
    assert!(drain(&mut rx).iter().any(|e| matches!(
        e,
        CoreEvent::Playback(PlaybackEvent::Rejected { .. })
    )));
}

// ============================================================================
// Races
// ============================================================================

#[tokio::test]
async fn test_late_play_of_superseded_activation_is_paused() {
    let bg = MockResource::background();
    bg.set_play_delay(Duration::from_millis(40));
    let engine = engine(&bg);
    let audio = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 120.0);
    let video = MockResource::inline(ResourceKind::InlineVideo, &url("v"), 60.0);

    let (first, second) = tokio::join!(
        engine.activate(ActivationRequest::standalone(audio.as_dyn(), track("a"))),
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            engine
                .activate(ActivationRequest::standalone(video.as_dyn(), track("v")))
                .await
        },
    );
    first.unwrap();
    second.unwrap();

    assert!(video.is_playing());
    assert!(!bg.is_playing());
    assert_eq!(engine.authoritative_id().await, Some(video.id()));
}

#[tokio::test]
async fn test_last_of_two_videos_wins() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let slow = MockResource::inline(ResourceKind::InlineVideo, &url("slow"), 60.0);
    slow.set_play_delay(Duration::from_millis(40));
    let fast = MockResource::inline(ResourceKind::InlineVideo, &url("fast"), 60.0);

    let _ = tokio::join!(
        engine.activate(ActivationRequest::standalone(slow.as_dyn(), track("slow"))),
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            engine
                .activate(ActivationRequest::standalone(fast.as_dyn(), track("fast")))
                .await
        },
    );

    assert!(fast.is_playing());
    assert!(!slow.is_playing());
    assert_eq!(engine.now_playing().title, "Track fast");
}

#[tokio::test]
async fn test_late_rejection_of_superseded_video_is_ignored() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let mut rx = engine.events().subscribe();
    let slow = MockResource::inline(ResourceKind::InlineVideo, &url("slow"), 60.0);
    slow.set_play_delay(Duration::from_millis(40));
    slow.set_reject_play(true);
    let fast = MockResource::inline(ResourceKind::InlineVideo, &url("fast"), 60.0);

    let _ = tokio::join!(
        engine.activate(ActivationRequest::standalone(slow.as_dyn(), track("slow"))),
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            engine
                .activate(ActivationRequest::standalone(fast.as_dyn(), track("fast")))
                .await
        },
    );

    assert!(fast.is_playing());
    let now = engine.now_playing();
    assert_eq!(now.title, "Track fast");
    assert!(now.playing);

    let rejected = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, CoreEvent::Playback(PlaybackEvent::Rejected { .. })))
        .count();
    assert_eq!(rejected, 0);
}

#[tokio::test]
async fn test_activation_silences_embedded_frame() {
    let bg = MockResource::background();
    let frame = RecordingFrame::mounted();
    let engine = engine_with(&bg, |deps| deps.with_frame_bridge(frame.clone()));
    let inline = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 180.0);

    engine
        .activate(ActivationRequest::standalone(inline.as_dyn(), track("a")))
        .await
        .unwrap();

    assert!(frame.call_count() >= 1);
    assert!(frame.calls.lock().iter().all(|token| token.is_none()));
    assert!(bg.is_playing());
}

#[tokio::test]
async fn test_absent_frame_does_not_block_activation() {
    let bg = MockResource::background();
    let frame = RecordingFrame::absent();
    let engine = engine_with(&bg, |deps| deps.with_frame_bridge(frame.clone()));
    let audio = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 180.0);
    let video = MockResource::inline(ResourceKind::InlineVideo, &url("v"), 30.0);

    engine
        .activate(ActivationRequest::standalone(audio.as_dyn(), track("a")))
        .await
        .unwrap();
    assert!(bg.is_playing());
    assert_eq!(bg.source_url(), Some(url("a")));

    engine
        .activate(ActivationRequest::standalone(video.as_dyn(), track("v")))
        .await
        .unwrap();
    assert!(video.is_playing());
    assert!(!bg.is_playing());
    assert!(frame.call_count() >= 2);
    assert_eq!(engine.now_playing().title, "Track v");
}

// ============================================================================
// Video interruption
// ============================================================================

#[tokio::test]
async fn test_video_interrupts_and_resumes_audio() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let mut rx = engine.events().subscribe();
    let audio = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 180.0);
    let video = MockResource::inline(ResourceKind::InlineVideo, &url("v"), 30.0);

    engine
        .activate(ActivationRequest::standalone(audio.as_dyn(), track("a")))
        .await
        .unwrap();
    bg.set_position(42.0);

    engine
        .activate(ActivationRequest::standalone(video.as_dyn(), track("v")))
        .await
        .unwrap();

    assert!(!bg.is_playing());
    assert!(video.is_playing());
    let snapshot = engine.interrupted().await.expect("audio was snapshotted");
    assert_eq!(snapshot.source_url, url("a"));
    assert_eq!(snapshot.position_secs, 42.0);
    assert_eq!(snapshot.origin, Some(audio.id()));

    end_naturally(&engine, &video).await;

    assert!(bg.is_playing());
    assert_eq!(bg.source_url(), Some(url("a")));
    assert_eq!(bg.position(), 42.0);
    assert!(engine.interrupted().await.is_none());
    assert_eq!(engine.authoritative_id().await, Some(bg.id()));
    assert_eq!(engine.now_playing().title, "Track a");

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::Playback(PlaybackEvent::Interrupted { .. }))));
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::Playback(PlaybackEvent::InterruptResumed { .. }))));
}

#[tokio::test]
async fn test_interrupt_resume_beats_repeat_one() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    engine.set_repeat_mode(RepeatMode::One).await;
    let audio = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 180.0);
    let video = MockResource::inline(ResourceKind::InlineVideo, &url("v"), 30.0);

    engine
        .activate(ActivationRequest::standalone(audio.as_dyn(), track("a")))
        .await
        .unwrap();
    engine
        .activate(ActivationRequest::standalone(video.as_dyn(), track("v")))
        .await
        .unwrap();

    end_naturally(&engine, &video).await;

    assert!(!video.is_playing());
    assert!(bg.is_playing());
    assert_eq!(engine.authoritative_id().await, Some(bg.id()));
}

#[tokio::test]
async fn test_events_from_non_authoritative_resources_are_ignored() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let audio = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 180.0);
    let video = MockResource::inline(ResourceKind::InlineVideo, &url("v"), 30.0);

    engine
        .activate(ActivationRequest::standalone(audio.as_dyn(), track("a")))
        .await
        .unwrap();
    engine
        .activate(ActivationRequest::standalone(video.as_dyn(), track("v")))
        .await
        .unwrap();

    // A stale "ended" from the paused background must not resume anything
    engine
        .handle_resource_event(bg.id(), ResourceEvent::Ended)
        .await
        .unwrap();
    engine
        .handle_resource_event(audio.id(), ResourceEvent::Play)
        .await
        .unwrap();

    assert!(video.is_playing());
    assert!(!bg.is_playing());
    assert!(engine.interrupted().await.is_some());
    assert_eq!(engine.authoritative_id().await, Some(video.id()));
}

// ============================================================================
// Queue and repeat
// ============================================================================

#[tokio::test]
async fn test_playlist_repeat_all_wraps_to_start() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    engine.set_repeat_mode(RepeatMode::All).await;

    engine
        .activate(ActivationRequest::playlist(playlist(5), 2))
        .await
        .unwrap();
    assert_eq!(bg.source_url(), Some(url("2")));
    engine.resume_store().remember(&url("0"), 90.0, 180.0);

    for expected in [3, 4, 0] {
        end_naturally(&engine, &bg).await;
        assert_eq!(engine.queue().await.current_index(), Some(expected));
        assert_eq!(bg.source_url(), Some(url(&expected.to_string())));
    }

    assert_eq!(bg.position(), 0.0);
    assert!(bg.is_playing());
}

#[tokio::test]
async fn test_playlist_repeat_off_stops_on_last() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let mut rx = engine.events().subscribe();

    engine
        .activate(ActivationRequest::playlist(playlist(5), 2))
        .await
        .unwrap();

    end_naturally(&engine, &bg).await;
    end_naturally(&engine, &bg).await;
    assert_eq!(engine.queue().await.current_index(), Some(4));

    end_naturally(&engine, &bg).await;
    assert_eq!(engine.queue().await.current_index(), Some(4));
    assert!(!bg.is_playing());
    assert!(!engine.now_playing().playing);
    assert!(drain(&mut rx).iter().any(|e| matches!(
        e,
        CoreEvent::Queue(QueueEvent::Exhausted { last_index: 4 })
    )));
}

#[tokio::test]
async fn test_repeat_one_replays_current_entry() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    engine.set_repeat_mode(RepeatMode::One).await;

    engine
        .activate(ActivationRequest::playlist(playlist(3), 1))
        .await
        .unwrap();
    end_naturally(&engine, &bg).await;

    assert_eq!(engine.queue().await.current_index(), Some(1));
    assert_eq!(bg.source_url(), Some(url("1")));
    assert_eq!(bg.position(), 0.0);
    assert!(bg.is_playing());
}

#[tokio::test]
async fn test_lone_resource_restarts_under_repeat() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    engine.set_repeat_mode(RepeatMode::All).await;
    let audio = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 120.0);

    engine
        .activate(ActivationRequest::standalone(audio.as_dyn(), track("a")))
        .await
        .unwrap();
    end_naturally(&engine, &bg).await;

    assert_eq!(bg.play_calls(), 2);
    assert_eq!(bg.position(), 0.0);
    assert!(bg.is_playing());
}

#[tokio::test]
async fn test_finished_track_is_not_resumed_on_advance() {
    let bg = MockResource::background();
    let engine = engine(&bg);

    engine
        .activate(ActivationRequest::playlist(playlist(2), 0))
        .await
        .unwrap();
    end_naturally(&engine, &bg).await;

    assert_eq!(engine.resume_store().resume_time(&url("0")), 0.0);
    assert!(engine.resume_store().record(&url("0")).is_some());
}

#[tokio::test]
async fn test_implicit_queue_follows_document_order() {
    let bg = MockResource::background();
    let surfaces: Vec<Arc<MockResource>> = ["x", "y", "z"]
        .iter()
        .map(|name| MockResource::inline(ResourceKind::InlineAudio, &url(name), 90.0))
        .collect();
    let scanned = surfaces
        .iter()
        .zip(["x", "y", "z"])
        .map(|(surface, name)| ScannedSurface {
            id: surface.id(),
            descriptor: TrackDescriptor::new(url(name)),
        })
        .collect();
    let engine = engine_with(&bg, |deps| {
        deps.with_surface_scanner(Arc::new(FixedScanner { surfaces: scanned }))
    });

    let defaults = TrackDefaults::default().with_byline("@poster");
    engine
        .activate(ActivationRequest::in_context(
            surfaces[1].as_dyn(),
            track("y"),
            defaults,
        ))
        .await
        .unwrap();

    let queue = engine.queue().await;
    assert_eq!(queue.mode(), QueueMode::Implicit);
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.current_index(), Some(1));
    assert_eq!(queue.entries()[0].track.byline, "@poster");

    end_naturally(&engine, &bg).await;
    assert_eq!(engine.queue().await.current_index(), Some(2));
    assert_eq!(bg.source_url(), Some(url("z")));
}

#[tokio::test]
async fn test_in_context_without_scanner_plays_alone() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let audio = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 120.0);

    engine
        .activate(ActivationRequest::in_context(
            audio.as_dyn(),
            track("a"),
            TrackDefaults::default(),
        ))
        .await
        .unwrap();

    assert!(engine.queue().await.is_empty());
    assert!(bg.is_playing());
}

#[tokio::test]
async fn test_play_at_out_of_range_is_noop() {
    let bg = MockResource::background();
    let engine = engine(&bg);

    engine
        .activate(ActivationRequest::playlist(playlist(3), 0))
        .await
        .unwrap();
    engine.play_at(7, false).await.unwrap();

    assert_eq!(engine.queue().await.current_index(), Some(0));
    assert_eq!(bg.source_url(), Some(url("0")));
}

#[tokio::test]
async fn test_invalid_playlist_start_is_ignored() {
    let bg = MockResource::background();
    let engine = engine(&bg);

    engine
        .activate(ActivationRequest::playlist(playlist(3), 3))
        .await
        .unwrap();

    assert!(engine.queue().await.is_empty());
    assert_eq!(engine.authoritative_id().await, None);
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn test_skip_previous_restarts_after_threshold() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    engine
        .activate(ActivationRequest::playlist(playlist(3), 2))
        .await
        .unwrap();

    bg.set_position(30.0);
    engine.skip_previous().await.unwrap();
    assert_eq!(engine.queue().await.current_index(), Some(2));
    assert_eq!(bg.position(), 0.0);

    engine.skip_previous().await.unwrap();
    assert_eq!(engine.queue().await.current_index(), Some(1));
    assert_eq!(bg.source_url(), Some(url("1")));
}

#[tokio::test]
async fn test_skip_next_at_end_respects_repeat() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    engine
        .activate(ActivationRequest::playlist(playlist(2), 1))
        .await
        .unwrap();

    engine.skip_next().await.unwrap();
    assert_eq!(engine.queue().await.current_index(), Some(1));

    engine.cycle_repeat_mode().await;
    assert_eq!(engine.repeat_mode(), RepeatMode::All);
    engine.skip_next().await.unwrap();
    assert_eq!(engine.queue().await.current_index(), Some(0));
}

#[tokio::test]
async fn test_seek_and_progress() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    engine
        .activate(ActivationRequest::playlist(playlist(1), 0))
        .await
        .unwrap();

    engine.seek_to_percent(50.0).await.unwrap();
    assert_eq!(bg.position(), 90.0);

    engine.handle_media_action(MediaAction::SeekForward).await.unwrap();
    assert_eq!(bg.position(), 100.0);

    engine.seek_by(1_000.0).await.unwrap();
    assert_eq!(bg.position(), 180.0);

    bg.set_position(45.0);
    engine
        .handle_resource_event(bg.id(), ResourceEvent::TimeUpdate)
        .await
        .unwrap();
    assert_eq!(engine.now_playing().percent, 25);
    assert_eq!(engine.resume_store().resume_time(&url("0")), 45.0);
}

#[tokio::test]
async fn test_seek_with_unknown_duration_is_noop() {
    let bg = MockResource::background();
    bg.set_load_duration(0.0);
    let engine = engine(&bg);
    engine
        .activate(ActivationRequest::playlist(playlist(1), 0))
        .await
        .unwrap();
    bg.set_position(7.0);

    engine.seek_to_percent(50.0).await.unwrap();
    assert_eq!(bg.position(), 7.0);
}

#[tokio::test]
async fn test_toggle_play_and_pause_remembers_position() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    engine
        .activate(ActivationRequest::playlist(playlist(1), 0))
        .await
        .unwrap();
    bg.set_position(33.0);

    engine.toggle_play().await.unwrap();
    assert!(!bg.is_playing());
    assert_eq!(engine.resume_store().resume_time(&url("0")), 33.0);

    engine.toggle_play().await.unwrap();
    assert!(bg.is_playing());
    assert_eq!(bg.position(), 33.0);
}

#[tokio::test]
async fn test_resume_after_end_starts_over() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    engine
        .activate(ActivationRequest::playlist(playlist(1), 0))
        .await
        .unwrap();
    end_naturally(&engine, &bg).await;
    assert!(!bg.is_playing());

    engine.resume().await.unwrap();
    assert!(bg.is_playing());
    assert_eq!(bg.position(), 0.0);
}

#[tokio::test]
async fn test_close_releases_everything() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let mut rx = engine.events().subscribe();
    let audio = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 120.0);

    engine
        .activate(ActivationRequest::in_context(
            audio.as_dyn(),
            track("a"),
            TrackDefaults::default(),
        ))
        .await
        .unwrap();
    bg.set_position(20.0);

    engine.close().await.unwrap();

    assert!(!bg.is_playing());
    assert!(audio.visible());
    assert_eq!(audio.proxy(), None);
    assert_eq!(engine.authoritative_id().await, None);
    assert!(engine.queue().await.is_empty());
    assert!(engine.now_playing().is_idle());
    assert_eq!(engine.resume_store().resume_time(&url("a")), 20.0);
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, CoreEvent::Playback(PlaybackEvent::Closed))));
}

#[tokio::test]
async fn test_unregistering_origin_keeps_background_playing() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let audio = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 120.0);

    engine
        .activate(ActivationRequest::standalone(audio.as_dyn(), track("a")))
        .await
        .unwrap();
    engine.unregister_surface(audio.id()).await;

    assert!(bg.is_playing());
    assert_eq!(engine.authoritative_id().await, Some(bg.id()));
}

// ============================================================================
// External playback and OS integration
// ============================================================================

#[tokio::test]
async fn test_external_now_playing_pauses_own_audio() {
    let bg = MockResource::background();
    let session = Arc::new(RecordingSession::default());
    let engine = engine_with(&bg, |deps| deps.with_media_session(session.clone()));

    engine
        .activate(ActivationRequest::playlist(playlist(1), 0))
        .await
        .unwrap();

    engine
        .notify_external_now_playing(ExternalTrack {
            title: "Voice note".to_string(),
            byline: "chat".to_string(),
            cover_url: None,
        })
        .await
        .unwrap();

    assert!(!bg.is_playing());
    let now = engine.now_playing();
    assert!(now.external);
    assert_eq!(now.title, "Voice note");
    assert_eq!(
        session.metadata.lock().last().map(|m| m.title.clone()),
        Some("Voice note".to_string())
    );

    engine.resume().await.unwrap();
    assert!(bg.is_playing());
    let now = engine.now_playing();
    assert!(!now.external);
    assert_eq!(now.title, "Track 0");
}

#[tokio::test]
async fn test_media_session_tracks_state() {
    let bg = MockResource::background();
    let session = Arc::new(RecordingSession::default());
    let engine = engine_with(&bg, |deps| deps.with_media_session(session.clone()));

    engine
        .activate(ActivationRequest::playlist(playlist(2), 0))
        .await
        .unwrap();
    engine.handle_media_action(MediaAction::NextTrack).await.unwrap();
    engine.handle_media_action(MediaAction::Pause).await.unwrap();

    let titles: Vec<String> = session.metadata.lock().iter().map(|m| m.title.clone()).collect();
    assert_eq!(titles, vec!["Track 0".to_string(), "Track 1".to_string()]);
    assert_eq!(session.states.lock().last(), Some(&false));
}

// ============================================================================
// Mini-player
// ============================================================================

#[tokio::test]
async fn test_mini_player_projection_and_controls() {
    let bg = MockResource::background();
    let engine = engine(&bg);
    let player = MiniPlayer::new(engine.clone());

    assert!(!player.state().await.visible);

    engine
        .activate(ActivationRequest::playlist(playlist(3), 0))
        .await
        .unwrap();
    bg.set_position(45.0);
    engine
        .handle_resource_event(bg.id(), ResourceEvent::TimeUpdate)
        .await
        .unwrap();

    let state = player.state().await;
    assert!(state.visible);
    assert!(state.playing);
    assert_eq!(state.ticker, "Track 0 · @dj");
    assert_eq!(state.elapsed, "0:45");
    assert_eq!(state.total, "3:00");
    assert_eq!(state.percent, 25);
    assert_eq!(state.queue.len(), 3);
    assert!(state.queue[0].current);
    assert_eq!(state.queue_mode, Some(QueueMode::Explicit));

    player.dispatch(ControlAction::CycleRepeat).await.unwrap();
    player.dispatch(ControlAction::PlayQueueItem(2)).await.unwrap();
    let state = player.state().await;
    assert_eq!(state.repeat, RepeatMode::All);
    assert!(state.queue[2].current);
    assert_eq!(bg.source_url(), Some(url("2")));

    player.dispatch(ControlAction::TogglePlay).await.unwrap();
    assert!(!player.state().await.playing);

    player.dispatch(ControlAction::Close).await.unwrap();
    assert!(!player.state().await.visible);
}
