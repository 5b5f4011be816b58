//! # Symphonia Decoder Implementation
//!
//! Whole-file PCM decoding for waveform analysis.

use crate::decoder::format_detector::FormatDetector;
use crate::decoder::sample_converter::SampleConverter;
use crate::decoder::PcmDecoder;
use crate::error::{PlaybackError, Result};
use bytes::Bytes;
use std::io::Cursor;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use tracing::{debug, instrument, warn};

const MAX_CONSECUTIVE_ERRORS: usize = 10;

/// [`PcmDecoder`] backed by Symphonia's default probe and codec registry.
///
/// Stateless; one instance can serve every waveform request. Corrupt packets
/// are skipped, and only a run of `MAX_CONSECUTIVE_ERRORS` failures in a row
/// aborts the decode.
#[derive(Debug, Default, Clone)]
pub struct SymphoniaPcmDecoder {
    /// Stop after this many samples (`None` decodes the whole stream).
    max_samples: Option<usize>,
}

impl SymphoniaPcmDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of decoded samples, for very long streams.
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = Some(max_samples);
        self
    }
}

impl PcmDecoder for SymphoniaPcmDecoder {
    #[instrument(skip(self, data), fields(bytes = data.len(), hint = ?extension_hint))]
    fn decode_first_channel(&self, data: Bytes, extension_hint: Option<&str>) -> Result<Vec<f32>> {
        if data.is_empty() {
            return Err(PlaybackError::InvalidFormat("Empty media buffer".to_string()));
        }

        let hint = FormatDetector::hint_from_extension(extension_hint);
        let media_source = Box::new(Cursor::new(data)) as Box<dyn MediaSource>;
        let mss = MediaSourceStream::new(media_source, Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| PlaybackError::InvalidFormat(format!("Failed to probe format: {}", e)))?;

        let mut format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| PlaybackError::InvalidFormat("No audio tracks".to_string()))?;

        let track_id = track.id;
        let codec = FormatDetector::detect_codec(track.codec_params.codec);
        FormatDetector::validate_codec_support(&codec)?;
        debug!(?codec, track_id, "Selected audio track");

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                PlaybackError::UnsupportedCodec(format!("Failed to create codec decoder: {}", e))
            })?;

        let mut samples = Vec::new();
        let mut consecutive_errors = 0;

        loop {
            if let Some(max) = self.max_samples {
                if samples.len() >= max {
                    samples.truncate(max);
                    break;
                }
            }

            let packet = match format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    // Chained streams: the first link is enough for a waveform
                    debug!("Track list changed, stopping at first stream");
                    break;
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(PlaybackError::DecodingError(format!(
                            "Failed to read packet: {}",
                            e
                        )));
                    }
                    continue;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    consecutive_errors = 0;
                    samples.extend(SampleConverter::first_channel_f32(&decoded));
                }
                Err(e @ (SymphoniaError::IoError(_) | SymphoniaError::DecodeError(_)))
                    if consecutive_errors + 1 < MAX_CONSECUTIVE_ERRORS =>
                {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping corrupted packet (attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, e
                    );
                }
                Err(e) => {
                    return Err(PlaybackError::DecodingError(format!(
                        "Failed to decode packet: {}",
                        e
                    )));
                }
            }
        }

        if samples.is_empty() {
            return Err(PlaybackError::NoSamples);
        }

        SampleConverter::sanitize(&mut samples);
        debug!(samples = samples.len(), "Decoded first channel");
        Ok(samples)
    }
}
