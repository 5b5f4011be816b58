//! RMS bucketing and height normalization.

use serde::{Deserialize, Serialize};

/// Visual range the normalized heights are mapped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarStyle {
    pub min_height: f32,
    pub max_height: f32,
    /// Floor for the normalization divisor.
    pub silence_epsilon: f32,
}

impl Default for BarStyle {
    fn default() -> Self {
        Self {
            min_height: 4.0,
            max_height: 24.0,
            silence_epsilon: 1e-4,
        }
    }
}

impl BarStyle {
    /// Map a `0.0..=1.0` level into `min_height..=max_height`.
    pub fn scale(&self, level: f32) -> f32 {
        let level = if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 };
        self.min_height + level * (self.max_height - self.min_height)
    }
}

/// Root-mean-square magnitude of `bucket_count` contiguous windows.
///
/// Windows are `ceil(len / bucket_count)` samples long, so the last window
/// may be shorter and, for very short inputs, trailing windows may be empty
/// (magnitude `0.0`). Always returns exactly `bucket_count` values.
pub fn rms_buckets(samples: &[f32], bucket_count: usize) -> Vec<f32> {
    if bucket_count == 0 {
        return Vec::new();
    }
    if samples.is_empty() {
        return vec![0.0; bucket_count];
    }

    let window = samples.len().div_ceil(bucket_count);

    (0..bucket_count)
        .map(|bucket| {
            let start = (bucket * window).min(samples.len());
            let end = (start + window).min(samples.len());
            let slice = &samples[start..end];

            if slice.is_empty() {
                return 0.0;
            }

            let sum: f64 = slice.iter().map(|&s| (s as f64) * (s as f64)).sum();
            (sum / slice.len() as f64).sqrt() as f32
        })
        .collect()
}

/// Normalize magnitudes against their maximum and map them into `style`.
pub fn normalize(magnitudes: &[f32], style: &BarStyle) -> Vec<f32> {
    let peak = magnitudes
        .iter()
        .copied()
        .filter(|m| m.is_finite())
        .fold(0.0f32, f32::max)
        .max(style.silence_epsilon);

    magnitudes.iter().map(|&m| style.scale(m / peak)).collect()
}

/// Full analysis: bucket, then normalize.
pub fn heights_from_samples(samples: &[f32], bucket_count: usize, style: &BarStyle) -> Vec<f32> {
    normalize(&rms_buckets(samples, bucket_count), style)
}
