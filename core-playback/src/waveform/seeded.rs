//! Deterministic pseudo-waveform for tracks that can't be analyzed.
//!
//! The shape is a smooth two-harmonic wave whose phase comes from a SHA-256
//! of the seed, plus per-bucket jitter taken from the same digest stream.
//! Same seed and bucket count always give the same heights.

use super::analyzer::BarStyle;
use sha2::{Digest, Sha256};
use std::f32::consts::TAU;

/// `bucket_count` heights derived from `seed` (normally the display title).
///
/// Never fails. An empty seed still produces a valid shape.
pub fn seeded_heights(seed: &str, bucket_count: usize, style: &BarStyle) -> Vec<f32> {
    if bucket_count == 0 {
        return Vec::new();
    }

    let digest = Sha256::digest(seed.as_bytes());
    let phase = digest[0] as f32 / 255.0 * TAU;
    let ripple = 2.0 + (digest[1] % 4) as f32;

    let jitter = jitter_stream(seed, bucket_count);

    (0..bucket_count)
        .map(|i| {
            let t = i as f32 / bucket_count as f32;
            let base = 0.55
                + 0.25 * (t * TAU + phase).sin()
                + 0.12 * (t * TAU * ripple + phase * 0.5).sin();
            let noise = (jitter[i] as f32 / 255.0 - 0.5) * 0.3;
            style.scale(base + noise)
        })
        .collect()
}

/// One pseudo-random byte per bucket: SHA-256 of `seed || block`, block by block.
fn jitter_stream(seed: &str, len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    let mut block: u32 = 0;

    while out.len() < len {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(block.to_le_bytes());
        out.extend_from_slice(&hasher.finalize());
        block += 1;
    }

    out.truncate(len);
    out
}
