//! Coalescing waveform cache.

use super::analyzer::{heights_from_samples, BarStyle};
use super::seeded::seeded_heights;
use crate::decoder::PcmDecoder;
use crate::error::{PlaybackError, Result};
use bridge_traits::HttpClient;
use core_runtime::logging::strip_path;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

type HeightsFuture = Shared<BoxFuture<'static, Result<Arc<Vec<f32>>>>>;

struct CacheEntry {
    /// Distinguishes a retried entry from the failed one it replaced.
    id: u64,
    future: HeightsFuture,
}

/// Heights for one track, with the reason real analysis was skipped if it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub heights: Arc<Vec<f32>>,
    pub fallback: Option<PlaybackError>,
}

impl Waveform {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Fetches, decodes and analyzes audio into bar heights, memoized per
/// `(source_url, bucket_count)`.
///
/// Concurrent requests for one key share a single in-flight future. Resolved
/// entries live for the lifetime of the service; failed ones are dropped so
/// the next request retries. Analysis does not depend on which resource is
/// playing, so a request outlives any track switch that happens meanwhile.
pub struct WaveformService {
    http: Option<Arc<dyn HttpClient>>,
    decoder: Option<Arc<dyn PcmDecoder>>,
    style: BarStyle,
    fetch_timeout: Duration,
    cache: Mutex<HashMap<String, CacheEntry>>,
    next_id: AtomicU64,
}

impl WaveformService {
    pub fn new(
        http: Option<Arc<dyn HttpClient>>,
        decoder: Option<Arc<dyn PcmDecoder>>,
        style: BarStyle,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            http,
            decoder,
            style,
            fetch_timeout,
            cache: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// A service that can only produce seeded shapes.
    pub fn seeded_only(style: BarStyle) -> Self {
        Self::new(None, None, style, Duration::from_secs(30))
    }

    pub fn style(&self) -> &BarStyle {
        &self.style
    }

    /// Real heights for `source_url`, sharing any in-flight analysis.
    ///
    /// # Errors
    ///
    /// Whatever the fetch or decode failed with. Failures are not cached.
    #[instrument(skip(self), fields(source = %strip_path(source_url)))]
    pub async fn heights(&self, source_url: &str, bucket_count: usize) -> Result<Arc<Vec<f32>>> {
        if source_url.trim().is_empty() {
            return Err(PlaybackError::EmptySource);
        }

        let key = cache_key(source_url, bucket_count);
        let (id, future) = self.entry(&key, source_url, bucket_count);

        let result = future.await;

        if let Err(e) = &result {
            let mut cache = self.cache.lock();
            if cache.get(&key).is_some_and(|entry| entry.id == id) {
                cache.remove(&key);
                debug!(error = %e, "Dropped failed waveform entry");
            }
        }

        result
    }

    /// Real heights when analysis succeeds, otherwise the seeded shape for
    /// `title`. Never fails and always returns `bucket_count` values.
    pub async fn heights_or_seeded(
        &self,
        source_url: &str,
        title: &str,
        bucket_count: usize,
    ) -> Waveform {
        match self.heights(source_url, bucket_count).await {
            Ok(heights) => Waveform {
                heights,
                fallback: None,
            },
            Err(e) => {
                warn!(
                    source = %strip_path(source_url),
                    error = %e,
                    "Waveform analysis failed, using seeded shape"
                );
                Waveform {
                    heights: Arc::new(self.seeded(source_url, title, bucket_count)),
                    fallback: Some(e),
                }
            }
        }
    }

    /// Seeded shape only, without touching the network.
    pub fn seeded(&self, source_url: &str, title: &str, bucket_count: usize) -> Vec<f32> {
        let seed = if title.trim().is_empty() {
            source_url
        } else {
            title
        };
        seeded_heights(seed, bucket_count, &self.style)
    }

    /// `true` when a successful result is cached for this key.
    pub fn is_ready(&self, source_url: &str, bucket_count: usize) -> bool {
        self.cache
            .lock()
            .get(&cache_key(source_url, bucket_count))
            .and_then(|entry| entry.future.peek().map(|r| r.is_ok()))
            .unwrap_or(false)
    }

    /// Number of pending or resolved entries.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn entry(&self, key: &str, source_url: &str, bucket_count: usize) -> (u64, HeightsFuture) {
        let mut cache = self.cache.lock();

        if let Some(entry) = cache.get(key) {
            // A resolved failure that no waiter has cleaned up yet is not reused
            let failed = matches!(entry.future.peek(), Some(Err(_)));
            if !failed {
                return (entry.id, entry.future.clone());
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let future = analyze(
            source_url.to_string(),
            bucket_count,
            self.http.clone(),
            self.decoder.clone(),
            self.style,
            self.fetch_timeout,
        )
        .boxed()
        .shared();

        cache.insert(
            key.to_string(),
            CacheEntry {
                id,
                future: future.clone(),
            },
        );

        (id, future)
    }
}

fn cache_key(source_url: &str, bucket_count: usize) -> String {
    format!("{}::{}", source_url, bucket_count)
}

async fn analyze(
    source_url: String,
    bucket_count: usize,
    http: Option<Arc<dyn HttpClient>>,
    decoder: Option<Arc<dyn PcmDecoder>>,
    style: BarStyle,
    fetch_timeout: Duration,
) -> Result<Arc<Vec<f32>>> {
    let http = http.ok_or_else(|| {
        PlaybackError::SourceUnavailable("No HTTP client configured".to_string())
    })?;
    let decoder = decoder
        .ok_or_else(|| PlaybackError::SourceUnavailable("No PCM decoder available".to_string()))?;

    let bytes = http
        .fetch_bytes(&source_url, fetch_timeout)
        .await
        .map_err(|e| PlaybackError::FetchFailed(e.to_string()))?;

    debug!(bytes = bytes.len(), "Fetched audio for analysis");

    let extension = crate::waveform::extension_hint(&source_url);
    let samples = tokio::task::spawn_blocking(move || {
        decoder.decode_first_channel(bytes, extension.as_deref())
    })
    .await
    .map_err(|e| PlaybackError::Internal(format!("Decode task failed: {}", e)))??;

    if samples.is_empty() {
        return Err(PlaybackError::NoSamples);
    }

    let heights = heights_from_samples(&samples, bucket_count, &style);
    debug!(samples = samples.len(), bucket_count, "Waveform analyzed");
    Ok(Arc::new(heights))
}
