//! # Sample Format Converter
//!
//! Pulls the first channel out of a decoded Symphonia buffer as `f32`.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Sample converter that normalizes audio to `f32` in `[-1.0, 1.0]`.
///
/// Symphonia outputs planar buffers in whatever sample format the codec
/// produces (i16, i24, i32, f32, f64, unsigned variants). Waveform analysis
/// reads a single channel, so the converter only ever touches plane 0.
pub struct SampleConverter;

impl SampleConverter {
    /// First channel of `buffer` as normalized `f32` samples.
    ///
    /// A buffer with no channels yields an empty vector.
    pub fn first_channel_f32(buffer: &AudioBufferRef<'_>) -> Vec<f32> {
        match buffer {
            AudioBufferRef::F32(buf) => Self::first_plane(&**buf, |sample: f32| sample),
            AudioBufferRef::F64(buf) => {
                Self::first_plane(&**buf, |sample: f64| sample.into_sample())
            }
            AudioBufferRef::S32(buf) => {
                Self::first_plane(&**buf, |sample: i32| sample.into_sample())
            }
            AudioBufferRef::S16(buf) => {
                Self::first_plane(&**buf, |sample: i16| sample.into_sample())
            }
            AudioBufferRef::S24(buf) => {
                Self::first_plane(&**buf, |sample| IntoSample::into_sample(sample))
            }
            AudioBufferRef::S8(buf) => Self::first_plane(&**buf, |sample: i8| sample.into_sample()),
            AudioBufferRef::U32(buf) => {
                Self::first_plane(&**buf, |sample: u32| sample.into_sample())
            }
            AudioBufferRef::U16(buf) => {
                Self::first_plane(&**buf, |sample: u16| sample.into_sample())
            }
            AudioBufferRef::U24(buf) => {
                Self::first_plane(&**buf, |sample| IntoSample::into_sample(sample))
            }
            AudioBufferRef::U8(buf) => Self::first_plane(&**buf, |sample: u8| sample.into_sample()),
        }
    }

    fn first_plane<T>(buf: &AudioBuffer<T>, convert: fn(T) -> f32) -> Vec<f32>
    where
        T: Sample + Copy,
    {
        if buf.spec().channels.count() == 0 || buf.frames() == 0 {
            return Vec::new();
        }

        buf.chan(0).iter().map(|&sample| convert(sample)).collect()
    }

    /// Clamp samples to `[-1.0, 1.0]` and replace NaN with silence.
    pub fn sanitize(samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = if sample.is_nan() {
                0.0
            } else {
                sample.clamp(-1.0, 1.0)
            };
        }
    }
}
