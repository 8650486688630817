//! Sample-rate conversion.
//!
//! The classification service expects **16 kHz** audio.  [`Resampler`] is
//! the capability seam; two implementations ship:
//!
//! 1. [`SincResampler`] — band-limited sinc interpolation via `rubato`
//!    (`SincFixedIn` + `BlackmanHarris2` window), time-aligned with the
//!    input.  Default.
//! 2. [`LinearResampler`] — linear interpolation, no filtering.  Cheap and
//!    fine for speech already close to the target rate.
//!
//! Both keep the real-time duration: the output has exactly
//! [`output_frame_count`] frames.

use std::sync::Arc;

use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::samples::AudioBuffer;

/// Rate the classifier was trained on.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

// ---------------------------------------------------------------------------
// ResampleError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResampleError {
    #[error("invalid target sample rate: {0} Hz")]
    InvalidTargetRate(u32),

    /// The resampling backend refused the configuration or failed mid-stream.
    #[error("resampler failure: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Resampler trait
// ---------------------------------------------------------------------------

/// Converts an [`AudioBuffer`] to `target_rate`, channel by channel.
///
/// # Contract
///
/// - `target_rate == 0` → [`ResampleError::InvalidTargetRate`].
/// - Same rate → an equal copy; the input is never mutated.
/// - Zero frames in → zero frames out at `target_rate`.
/// - Otherwise exactly `output_frame_count(frames, from, to)` frames out,
///   still in floating point.
pub trait Resampler: Send + Sync {
    fn resample(&self, input: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer, ResampleError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Resampler>) {}
};

/// `round(frames * to / from)`, rounding halves up, in exact integer math.
///
/// ```rust
/// use voice_classify::audio::output_frame_count;
///
/// assert_eq!(output_frame_count(44_100, 44_100, 16_000), 16_000);
/// assert_eq!(output_frame_count(480, 48_000, 16_000), 160);
/// assert_eq!(output_frame_count(3, 2, 1), 2); // 1.5 rounds up
/// ```
pub fn output_frame_count(frames: usize, from_rate: u32, to_rate: u32) -> usize {
    let from = from_rate as u128;
    let num = frames as u128 * to_rate as u128;
    ((num + from / 2) / from) as usize
}

/// Shared handling of the cases every implementation treats the same way.
/// Returns `Some` when no interpolation is needed.
fn trivial_case(
    input: &AudioBuffer,
    target_rate: u32,
) -> Result<Option<AudioBuffer>, ResampleError> {
    if target_rate == 0 {
        return Err(ResampleError::InvalidTargetRate(target_rate));
    }
    if input.sample_rate() == target_rate {
        return Ok(Some(input.clone()));
    }
    if input.frame_count() == 0 {
        let empty = AudioBuffer::silent(target_rate, input.channel_count(), 0).map_err(backend)?;
        return Ok(Some(empty));
    }
    Ok(None)
}

fn assemble(target_rate: u32, channels: Vec<Vec<f32>>) -> Result<AudioBuffer, ResampleError> {
    AudioBuffer::new(target_rate, channels).map_err(backend)
}

// ---------------------------------------------------------------------------
// ResamplerKind
// ---------------------------------------------------------------------------

/// Resampler selection as written in `settings.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplerKind {
    #[default]
    Sinc,
    Linear,
}

impl ResamplerKind {
    pub fn build(self) -> Arc<dyn Resampler> {
        match self {
            ResamplerKind::Sinc => Arc::new(SincResampler::default()),
            ResamplerKind::Linear => Arc::new(LinearResampler),
        }
    }
}

// ---------------------------------------------------------------------------
// LinearResampler
// ---------------------------------------------------------------------------

/// Linear interpolation between neighbouring input samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearResampler;

impl Resampler for LinearResampler {
    fn resample(&self, input: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer, ResampleError> {
        if let Some(done) = trivial_case(input, target_rate)? {
            return Ok(done);
        }

        let from = input.sample_rate();
        let out_len = output_frame_count(input.frame_count(), from, target_rate);
        let step = from as f64 / target_rate as f64;

        let channels = input
            .channels()
            .iter()
            .map(|ch| interpolate_channel(ch, step, out_len))
            .collect();

        assemble(target_rate, channels)
    }
}

fn interpolate_channel(samples: &[f32], step: f64, out_len: usize) -> Vec<f32> {
    let last = samples.last().copied().unwrap_or(0.0);

    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 * step;
            let idx = src_pos as usize;
            let frac = (src_pos - idx as f64) as f32;

            match (samples.get(idx), samples.get(idx + 1)) {
                (Some(&a), Some(&b)) => a + (b - a) * frac,
                (Some(&a), None) => a,
                // Past the end (only reachable through upward rounding).
                _ => last,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SincResampler
// ---------------------------------------------------------------------------

/// Band-limited resampling with `rubato::SincFixedIn`.
///
/// rubato's output is already time-aligned with its input, so frames are
/// kept from the first one.  The tail is flushed with silence until the
/// expected length is reached, then the result is cut to exactly that many
/// frames.
#[derive(Debug, Clone, Copy)]
pub struct SincResampler {
    /// Input frames fed to rubato per call.
    pub chunk_size: usize,
    /// Length of the windowed sinc kernel in taps.
    pub sinc_len: usize,
}

impl Default for SincResampler {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            sinc_len: 128,
        }
    }
}

impl SincResampler {
    fn params(&self) -> SincInterpolationParameters {
        SincInterpolationParameters {
            sinc_len: self.sinc_len,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 128,
            window: WindowFunction::BlackmanHarris2,
        }
    }
}

fn backend<E: std::fmt::Display>(e: E) -> ResampleError {
    ResampleError::Backend(e.to_string())
}

impl Resampler for SincResampler {
    fn resample(&self, input: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer, ResampleError> {
        if let Some(done) = trivial_case(input, target_rate)? {
            return Ok(done);
        }

        let from = input.sample_rate();
        let frames = input.frame_count();
        let n_channels = input.channel_count();
        let out_len = output_frame_count(frames, from, target_rate);
        let ratio = target_rate as f64 / from as f64;
        let chunk = self.chunk_size.max(1);

        let mut rs = SincFixedIn::<f32>::new(ratio, 1.0, self.params(), chunk, n_channels)
            .map_err(backend)?;
        let mut out: Vec<Vec<f32>> = vec![Vec::with_capacity(out_len + chunk); n_channels];
        let append = |out: &mut Vec<Vec<f32>>, produced: Vec<Vec<f32>>| {
            for (dst, src) in out.iter_mut().zip(produced) {
                dst.extend_from_slice(&src);
            }
        };

        let mut pos = 0;
        while pos + chunk <= frames {
            let slices: Vec<&[f32]> = input
                .channels()
                .iter()
                .map(|ch| &ch[pos..pos + chunk])
                .collect();
            let produced = rs.process(slices.as_slice(), None).map_err(backend)?;
            append(&mut out, produced);
            pos += chunk;
        }

        if pos < frames {
            let slices: Vec<&[f32]> = input.channels().iter().map(|ch| &ch[pos..]).collect();
            let produced = rs.process_partial(Some(slices.as_slice()), None).map_err(backend)?;
            append(&mut out, produced);
        }

        // Flush the filter tail with silence.
        while out[0].len() < out_len {
            let produced = rs
                .process_partial(None::<&[&[f32]]>, None)
                .map_err(backend)?;
            if produced.first().map_or(true, Vec::is_empty) {
                break;
            }
            append(&mut out, produced);
        }

        for ch in out.iter_mut() {
            ch.resize(out_len, 0.0);
        }

        assemble(target_rate, out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, rate: u32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / rate as f64).sin() as f32 * 0.8)
            .collect()
    }

    fn mono(rate: u32, samples: Vec<f32>) -> AudioBuffer {
        AudioBuffer::new(rate, vec![samples]).unwrap()
    }

    fn all_resamplers() -> Vec<(&'static str, Box<dyn Resampler>)> {
        vec![
            ("linear", Box::new(LinearResampler)),
            ("sinc", Box::new(SincResampler::default())),
        ]
    }

    // ---- shared contract ---------------------------------------------------

    #[test]
    fn same_rate_is_an_equal_copy() {
        let input = mono(16_000, (0..160).map(|i| i as f32 / 160.0).collect());
        for (name, r) in all_resamplers() {
            let out = r.resample(&input, 16_000).unwrap();
            assert_eq!(out, input, "{name}");
        }
    }

    #[test]
    fn zero_target_rate_is_rejected() {
        let input = mono(44_100, vec![0.0; 10]);
        for (name, r) in all_resamplers() {
            assert_eq!(
                r.resample(&input, 0).unwrap_err(),
                ResampleError::InvalidTargetRate(0),
                "{name}"
            );
        }
    }

    #[test]
    fn empty_input_gives_empty_output_at_target_rate() {
        let input = AudioBuffer::silent(48_000, 2, 0).unwrap();
        for (name, r) in all_resamplers() {
            let out = r.resample(&input, 16_000).unwrap();
            assert_eq!(out.sample_rate(), 16_000, "{name}");
            assert_eq!(out.frame_count(), 0, "{name}");
            assert_eq!(out.channel_count(), 2, "{name}");
        }
    }

    #[test]
    fn duration_is_preserved_for_common_rates() {
        for (name, r) in all_resamplers() {
            for (from, frames) in [(44_100, 44_100), (48_000, 4_801), (8_000, 123), (22_050, 1)] {
                let input = mono(from, vec![0.1; frames]);
                let out = r.resample(&input, TARGET_SAMPLE_RATE).unwrap();
                let in_secs = frames as f64 / from as f64;
                let out_secs = out.frame_count() as f64 / TARGET_SAMPLE_RATE as f64;
                assert!(
                    (out_secs - in_secs).abs() < 1.0 / TARGET_SAMPLE_RATE as f64,
                    "{name}: {from} Hz x {frames} -> {} frames",
                    out.frame_count()
                );
            }
        }
    }

    #[test]
    fn channel_count_is_preserved() {
        let input = AudioBuffer::new(48_000, vec![vec![0.2; 2_000], vec![-0.2; 2_000]]).unwrap();
        for (name, r) in all_resamplers() {
            let out = r.resample(&input, 16_000).unwrap();
            assert_eq!(out.channel_count(), 2, "{name}");
            assert_eq!(out.frame_count(), 667, "{name}");
        }
    }

    #[test]
    fn input_is_not_mutated() {
        let input = mono(48_000, sine(440.0, 48_000, 3_000));
        let snapshot = input.clone();
        for (_, r) in all_resamplers() {
            let _ = r.resample(&input, 16_000).unwrap();
        }
        assert_eq!(input, snapshot);
    }

    // ---- linear ------------------------------------------------------------

    #[test]
    fn linear_48k_to_16k_output_length() {
        let out = LinearResampler.resample(&mono(48_000, vec![0.5; 480]), 16_000).unwrap();
        assert_eq!(out.frame_count(), 160);
    }

    #[test]
    fn linear_constant_signal_preserves_amplitude() {
        let out = LinearResampler.resample(&mono(48_000, vec![0.5; 480]), 16_000).unwrap();
        for &s in &out.channels()[0] {
            assert!((s - 0.5).abs() < 1e-6, "amplitude drift: {s}");
        }
    }

    #[test]
    fn linear_upsample_from_8k_interpolates_midpoints() {
        let out = LinearResampler.resample(&mono(8_000, vec![0.0, 1.0, 0.0]), 16_000).unwrap();
        assert_eq!(out.frame_count(), 6);
        assert!((out.channels()[0][1] - 0.5).abs() < 1e-6);
        assert!((out.channels()[0][2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn linear_tracks_a_sine() {
        let out = LinearResampler
            .resample(&mono(44_100, sine(440.0, 44_100, 44_100)), 16_000)
            .unwrap();
        let expected = sine(440.0, 16_000, 16_000);
        for (i, (a, b)) in out.channels()[0].iter().zip(&expected).enumerate() {
            assert!((a - b).abs() < 0.01, "sample {i}: {a} vs {b}");
        }
    }

    // ---- sinc --------------------------------------------------------------

    #[test]
    fn sinc_constant_signal_preserves_amplitude_away_from_edges() {
        let out = SincResampler::default()
            .resample(&mono(48_000, vec![0.5; 9_600]), 16_000)
            .unwrap();
        assert_eq!(out.frame_count(), 3_200);
        for &s in &out.channels()[0][200..3_000] {
            assert!((s - 0.5).abs() < 0.01, "amplitude drift: {s}");
        }
    }

    #[test]
    fn sinc_tracks_a_low_frequency_sine() {
        let out = SincResampler::default()
            .resample(&mono(44_100, sine(50.0, 44_100, 44_100)), 16_000)
            .unwrap();
        let expected = sine(50.0, 16_000, 16_000);
        for i in 400..15_600 {
            let (a, b) = (out.channels()[0][i], expected[i]);
            assert!((a - b).abs() < 0.05, "sample {i}: {a} vs {b}");
        }
    }

    /// Mean absolute error between `out[i]` and `ideal[i + lag]` over the
    /// interior of the signal.
    fn lag_error(out: &[f32], ideal: &[f32], lag: isize) -> f32 {
        let range = 200..out.len() - 200;
        let n = range.len() as f32;
        range
            .map(|i| (out[i] - ideal[(i as isize + lag) as usize]).abs())
            .sum::<f32>()
            / n
    }

    #[test]
    fn sinc_output_is_time_aligned_with_input() {
        let out = SincResampler::default()
            .resample(&mono(44_100, sine(50.0, 44_100, 44_100)), 16_000)
            .unwrap();
        let ideal = sine(50.0, 16_000, 16_000);
        let out = &out.channels()[0];

        let best = (-40..=40isize)
            .min_by(|&a, &b| {
                lag_error(out, &ideal, a)
                    .partial_cmp(&lag_error(out, &ideal, b))
                    .unwrap()
            })
            .unwrap();
        assert_eq!(best, 0, "output is shifted by {best} frames");
    }

    #[test]
    fn sinc_keeps_the_start_of_the_signal() {
        // A step at t = 0: a shifted output would already be at full level.
        let input = mono(48_000, vec![0.5; 4_800]);
        let out = SincResampler::default().resample(&input, 16_000).unwrap();
        let out = &out.channels()[0];
        assert!(out[0] < 0.4, "first sample {} is past the onset", out[0]);
        assert!((out[100] - 0.5).abs() < 0.01);
    }

    #[test]
    fn sinc_tracks_a_1khz_sine() {
        let out = SincResampler::default()
            .resample(&mono(44_100, sine(1_000.0, 44_100, 44_100)), 16_000)
            .unwrap();
        let expected = sine(1_000.0, 16_000, 16_000);
        for i in 400..15_600 {
            let (a, b) = (out.channels()[0][i], expected[i]);
            assert!((a - b).abs() < 0.05, "sample {i}: {a} vs {b}");
        }
    }

    #[test]
    fn sinc_handles_input_shorter_than_one_chunk() {
        let out = SincResampler::default()
            .resample(&mono(22_050, vec![0.3; 100]), 16_000)
            .unwrap();
        assert_eq!(out.frame_count(), output_frame_count(100, 22_050, 16_000));
    }

    // ---- kind --------------------------------------------------------------

    #[test]
    fn kind_builds_matching_resampler() {
        let input = mono(48_000, vec![0.5; 480]);
        for kind in [ResamplerKind::Sinc, ResamplerKind::Linear] {
            let out = kind.build().resample(&input, 16_000).unwrap();
            assert_eq!(out.frame_count(), 160);
        }
    }
}
