//! Planar floating-point sample buffer shared by the decoder and resampler.

use thiserror::Error;

use super::interleave::ChannelMismatchError;

/// A buffer could not be built from the given parts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("sample rate must be greater than zero")]
    ZeroSampleRate,

    #[error(transparent)]
    Channels(#[from] ChannelMismatchError),
}

fn check_rate(sample_rate: u32) -> Result<(), BufferError> {
    if sample_rate == 0 {
        Err(BufferError::ZeroSampleRate)
    } else {
        Ok(())
    }
}

/// Multi-channel `f32` audio at an explicit sample rate.
///
/// Each entry of `channels` holds one channel's samples; all channels have
/// the same length (the frame count).  Samples are nominally in
/// `[-1.0, 1.0]` but are not clipped here; the WAV encoder clamps.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Build a buffer from planar channel data.
    ///
    /// # Errors
    ///
    /// [`BufferError::ZeroSampleRate`] for a zero rate, and
    /// [`BufferError::Channels`] when the channel list is empty or the
    /// arrays differ in length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, BufferError> {
        check_rate(sample_rate)?;
        super::interleave::check_equal_lengths(&channels)?;
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// De-interleave frame-major samples into planar channels.
    ///
    /// A trailing partial frame is discarded.
    pub fn from_interleaved(
        sample_rate: u32,
        channel_count: u16,
        samples: &[f32],
    ) -> Result<Self, BufferError> {
        check_rate(sample_rate)?;
        let n = channel_count.max(1) as usize;
        let frames = samples.len() / n;
        let mut channels = vec![Vec::with_capacity(frames); n];
        for frame in samples.chunks_exact(n) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// `frames` of silence on `channel_count` channels.
    pub fn silent(
        sample_rate: u32,
        channel_count: usize,
        frames: usize,
    ) -> Result<Self, BufferError> {
        check_rate(sample_rate)?;
        Ok(Self {
            sample_rate,
            channels: vec![vec![0.0; frames]; channel_count.max(1)],
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Real-time length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }
}
