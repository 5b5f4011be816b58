//! Waveform cache behaviour: coalescing, failure fallback and retry, and
//! the prefetch the engine runs on activation.

mod common;

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{HttpClient, HttpRequest, HttpResponse, ResourceKind};
use bytes::Bytes;
use common::{url, MapStore, MockResource};
use core_playback::{
    ActivationRequest, BarStyle, EngineConfig, EngineDependencies, PcmDecoder, PlaybackEngine,
    PlaybackError, Track, WaveformService,
};
use core_runtime::events::{CoreEvent, WaveformEvent};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct BytesHttp {
    requests: AtomicUsize,
}

#[async_trait]
impl HttpClient for BytesHttp {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from_static(b"encoded audio"),
        })
    }
}

/// Produces a loud-then-quiet signal, optionally failing until told not to.
struct CountingDecoder {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl CountingDecoder {
    fn new(failing: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(failing),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PcmDecoder for CountingDecoder {
    fn decode_first_channel(
        &self,
        _data: Bytes,
        _extension_hint: Option<&str>,
    ) -> core_playback::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));

        if self.failing.load(Ordering::SeqCst) {
            return Err(PlaybackError::DecodingError("corrupt frame".to_string()));
        }

        let mut samples = vec![0.8_f32; 5_400];
        samples.extend(std::iter::repeat(0.05_f32).take(5_400));
        Ok(samples)
    }
}

fn service(decoder: &Arc<CountingDecoder>) -> (Arc<WaveformService>, Arc<BytesHttp>) {
    let http = Arc::new(BytesHttp {
        requests: AtomicUsize::new(0),
    });
    let decoder: Arc<dyn PcmDecoder> = decoder.clone();
    let service = WaveformService::new(
        Some(http.clone()),
        Some(decoder),
        BarStyle::default(),
        Duration::from_secs(5),
    );
    (Arc::new(service), http)
}

#[tokio::test]
async fn test_concurrent_requests_share_one_decode() {
    let decoder = CountingDecoder::new(false);
    let (service, http) = service(&decoder);
    let source = url("episode");

    let results = join_all((0..8).map(|_| service.heights(&source, 54))).await;

    assert_eq!(decoder.calls(), 1);
    assert_eq!(http.requests.load(Ordering::SeqCst), 1);

    let first = results[0].as_ref().unwrap();
    assert_eq!(first.len(), 54);
    for result in &results {
        assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
    }

    // Loud half reaches the top, quiet half stays near the bottom
    assert!((first[0] - 24.0).abs() < 1e-4);
    assert!(first[53] < 6.0);
    assert!(service.is_ready(&source, 54));
}

#[tokio::test]
async fn test_failed_decode_falls_back_then_retries() {
    let decoder = CountingDecoder::new(true);
    let (service, _http) = service(&decoder);
    let source = url("broken");

    let waveforms = join_all((0..3).map(|_| service.heights_or_seeded(&source, "Broken", 54))).await;

    assert_eq!(decoder.calls(), 1);
    for waveform in &waveforms {
        assert!(waveform.is_fallback());
        assert_eq!(waveform.heights.len(), 54);
        assert!(waveform.heights.iter().all(|h| (4.0..=24.0).contains(h)));
        assert_eq!(waveform.heights, waveforms[0].heights);
    }
    assert!(!service.is_ready(&source, 54));
    assert_eq!(service.cached_len(), 0);

    decoder.failing.store(false, Ordering::SeqCst);
    let waveform = service.heights_or_seeded(&source, "Broken", 54).await;

    assert!(!waveform.is_fallback());
    assert_eq!(decoder.calls(), 2);
    assert!(service.is_ready(&source, 54));
}

#[tokio::test]
async fn test_seeded_fallback_is_stable_across_services() {
    let style = BarStyle::default();
    let a = WaveformService::seeded_only(style);
    let b = WaveformService::seeded_only(style);

    let first = a.heights_or_seeded(&url("x"), "Same title", 54).await;
    let second = b.heights_or_seeded(&url("y"), "Same title", 54).await;

    assert!(matches!(
        first.fallback,
        Some(PlaybackError::SourceUnavailable(_))
    ));
    assert_eq!(first.heights, second.heights);
}

#[tokio::test]
async fn test_activation_prefetches_waveform() {
    let bg = MockResource::background();
    let decoder = CountingDecoder::new(false);
    let http = Arc::new(BytesHttp {
        requests: AtomicUsize::new(0),
    });
    let pcm: Arc<dyn PcmDecoder> = decoder.clone();
    let deps = EngineDependencies::new(Arc::new(MapStore::default()))
        .with_http_client(http)
        .with_decoder(Some(pcm));
    let engine = PlaybackEngine::new(EngineConfig::default(), bg.as_dyn(), deps).unwrap();
    let mut rx = engine.events().subscribe();

    let inline = MockResource::inline(ResourceKind::InlineAudio, &url("a"), 120.0);
    engine
        .activate(ActivationRequest::standalone(
            inline.as_dyn(),
            Track::new(url("a"), "A", "@dj"),
        ))
        .await
        .unwrap();

    let ready = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(CoreEvent::Waveform(WaveformEvent::Ready {
                    source_url,
                    bucket_count,
                })) => break (source_url, bucket_count),
                Ok(_) => continue,
                Err(e) => panic!("event stream closed: {}", e),
            }
        }
    })
    .await
    .expect("waveform prefetch finished");

    assert_eq!(ready, (url("a"), 54));
    assert!(engine.waveforms().is_ready(&url("a"), 54));
    assert_eq!(decoder.calls(), 1);
}
