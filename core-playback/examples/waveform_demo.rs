//! # Waveform Demo
//!
//! Decodes a local audio file and prints the bar heights the mini-player
//! would draw, next to the seeded fallback for the same title.
//!
//! Run with: `cargo run --example waveform_demo --package core-playback -- path/to/file.mp3`

use anyhow::Context;
use bytes::Bytes;
use core_playback::decoder::{FormatDetector, PcmDecoder, SymphoniaPcmDecoder};
use core_playback::waveform::analyzer::heights_from_samples;
use core_playback::waveform::seeded::seeded_heights;
use core_playback::BarStyle;
use std::time::Instant;

const BUCKETS: usize = 54;

fn main() -> anyhow::Result<()> {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: waveform_demo <audio file>");
        std::process::exit(2);
    };

    let data = Bytes::from(std::fs::read(&path).with_context(|| format!("reading {}", path))?);
    let extension = FormatDetector::extension_from_url(&path);
    let style = BarStyle::default();

    println!("Decoding {} ({} bytes)", path, data.len());
    let started = Instant::now();
    let samples = SymphoniaPcmDecoder::new()
        .decode_first_channel(data, extension.as_deref())
        .context("decoding")?;
    println!(
        "  {} samples from the first channel in {:?}",
        samples.len(),
        started.elapsed()
    );

    println!("\nAnalyzed:");
    print_bars(&heights_from_samples(&samples, BUCKETS, &style), &style);

    println!("\nSeeded fallback:");
    print_bars(&seeded_heights(&path, BUCKETS, &style), &style);

    Ok(())
}

fn print_bars(heights: &[f32], style: &BarStyle) {
    const ROWS: usize = 8;
    let range = (style.max_height - style.min_height).max(f32::EPSILON);

    for row in (1..=ROWS).rev() {
        let threshold = row as f32 / ROWS as f32;
        let line: String = heights
            .iter()
            .map(|h| {
                if (h - style.min_height) / range >= threshold - 0.5 / ROWS as f32 {
                    '█'
                } else {
                    ' '
                }
            })
            .collect();
        println!("  {}", line);
    }
}
