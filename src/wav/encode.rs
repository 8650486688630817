//! Interleaved `f32` → 16-bit PCM WAV bytes.
//!
//! # Quantization
//!
//! Each sample is clamped to `[-1.0, 1.0]` and scaled asymmetrically:
//!
//! * negative: `s * 32768`, so `-1.0` → `-32768`
//! * non-negative: `s * 32767`, so `1.0` → `32767`
//!
//! then truncated toward zero.  The asymmetry uses the full `i16` range and
//! must stay exactly like this for byte-identical output.

use thiserror::Error;

use super::header::{WavHeader, HEADER_LEN};

// ---------------------------------------------------------------------------
// EncodeError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("invalid channel count: {0}")]
    InvalidChannelCount(u16),

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// The sample count is not a whole number of frames.
    #[error("{samples} samples do not divide into {channels}-channel frames")]
    PartialFrame { samples: usize, channels: u16 },

    /// A header size field would overflow its 32-bit (or 16-bit) slot.
    #[error("WAV {field} too large: {value}")]
    TooLarge { field: &'static str, value: u64 },
}

// ---------------------------------------------------------------------------
// WavFile
// ---------------------------------------------------------------------------

/// A complete, immutable WAV file in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavFile {
    bytes: Vec<u8>,
    sample_rate: u32,
    channels: u16,
}

impl WavFile {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hand the bytes to the upload collaborator.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels
    }

    /// Length of the `data` payload in bytes.
    pub fn data_len(&self) -> usize {
        self.bytes.len() - HEADER_LEN
    }

    pub fn frame_count(&self) -> usize {
        self.data_len() / (2 * self.channels as usize)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Total file length (header + payload).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` when the file carries no samples.
    pub fn is_empty(&self) -> bool {
        self.data_len() == 0
    }
}

// ---------------------------------------------------------------------------
// quantize / encode
// ---------------------------------------------------------------------------

/// Map one `f32` sample to a signed 16-bit PCM code.  `NaN` maps to `0`.
///
/// ```rust
/// use voice_classify::wav::quantize;
///
/// assert_eq!(quantize(1.0), 32_767);
/// assert_eq!(quantize(-1.0), -32_768);
/// assert_eq!(quantize(2.5), 32_767);
/// assert_eq!(quantize(0.5), 16_383);
/// assert_eq!(quantize(-0.5), -16_384);
/// ```
pub fn quantize(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32_768.0) as i16
    } else {
        (s * 32_767.0) as i16
    }
}

/// Encode an interleaved stream as a canonical 16-bit PCM WAV file.
///
/// # Errors
///
/// * [`EncodeError::InvalidChannelCount`] / [`EncodeError::InvalidSampleRate`]
///   for zero parameters.
/// * [`EncodeError::PartialFrame`] when `samples.len()` is not a multiple of
///   `channels`.
/// * [`EncodeError::TooLarge`] when a header field would overflow.
pub fn encode(samples: &[f32], channels: u16, sample_rate: u32) -> Result<WavFile, EncodeError> {
    if channels == 0 {
        return Err(EncodeError::InvalidChannelCount(channels));
    }
    if sample_rate == 0 {
        return Err(EncodeError::InvalidSampleRate(sample_rate));
    }
    if samples.len() % channels as usize != 0 {
        return Err(EncodeError::PartialFrame {
            samples: samples.len(),
            channels,
        });
    }

    let block_align = channels as u64 * 2;
    if block_align > u16::MAX as u64 {
        return Err(EncodeError::TooLarge {
            field: "block align",
            value: block_align,
        });
    }
    let byte_rate = sample_rate as u64 * block_align;
    if byte_rate > u32::MAX as u64 {
        return Err(EncodeError::TooLarge {
            field: "byte rate",
            value: byte_rate,
        });
    }
    let data_size = samples.len() as u64 * 2;
    if data_size + 36 > u32::MAX as u64 {
        return Err(EncodeError::TooLarge {
            field: "data size",
            value: data_size,
        });
    }

    let mut bytes = Vec::with_capacity(HEADER_LEN + data_size as usize);
    WavHeader::pcm16(channels, sample_rate, data_size as u32).write_to(&mut bytes);
    for &s in samples {
        bytes.extend_from_slice(&quantize(s).to_le_bytes());
    }

    Ok(WavFile {
        bytes,
        sample_rate,
        channels,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
