//! Stage sequencing: blob → decode → resample → mix → WAV.
//!
//! [`Normalizer`] is the only place that knows the stage order.  It stops at
//! the first failing stage and returns that stage's own error type inside
//! [`NormalizeError`], so callers can still tell a decode failure from an
//! encode failure.
//!
//! The async [`Normalizer::normalize`] pushes decoding and resampling onto
//! `tokio::task::spawn_blocking` and awaits each one in turn, so the runtime
//! keeps serving other tasks while a long file is processed.

use std::sync::Arc;

use thiserror::Error;

use crate::audio::{
    mix_to, AudioBuffer, AudioDecoder, ChannelMismatchError, DecodeError, DefaultDecoder,
    RawAudioBlob, ResampleError, Resampler,
};
use crate::config::AudioConfig;
use crate::wav::{self, EncodeError, WavFile};

// ---------------------------------------------------------------------------
// NormalizeError
// ---------------------------------------------------------------------------

/// First failure in the pipeline, carrying the failing stage's own error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Resample(#[from] ResampleError),

    #[error(transparent)]
    ChannelMismatch(#[from] ChannelMismatchError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A blocking worker panicked or was cancelled.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NormalizeError {
    /// Name of the stage that failed, for display next to the message.
    pub fn stage(&self) -> &'static str {
        match self {
            NormalizeError::Decode(_) => "decode",
            NormalizeError::Resample(_) => "resample",
            NormalizeError::ChannelMismatch(_) => "interleave",
            NormalizeError::Encode(_) => "encode",
            NormalizeError::Internal(_) => "internal",
        }
    }
}

impl From<tokio::task::JoinError> for NormalizeError {
    fn from(e: tokio::task::JoinError) -> Self {
        NormalizeError::Internal(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Runs one blob through the full normalization sequence.
///
/// Holds no per-run state: every call allocates its own buffers, so one
/// `Normalizer` can be shared behind an `Arc`.
///
/// ```rust,no_run
/// use voice_classify::audio::{ContentType, RawAudioBlob};
/// use voice_classify::pipeline::Normalizer;
///
/// # async fn example(bytes: Vec<u8>) {
/// let normalizer = Normalizer::default();
/// let blob = RawAudioBlob::new(bytes, ContentType::wav());
/// let wav = normalizer.normalize(blob, 16_000, 1).await.unwrap();
/// assert_eq!(wav.sample_rate(), 16_000);
/// # }
/// ```
#[derive(Clone)]
pub struct Normalizer {
    decoder: Arc<dyn AudioDecoder>,
    resampler: Arc<dyn Resampler>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&AudioConfig::default())
    }
}

impl Normalizer {
    pub fn new(decoder: Arc<dyn AudioDecoder>, resampler: Arc<dyn Resampler>) -> Self {
        Self { decoder, resampler }
    }

    /// Default decoder plus the resampler chosen in `config`.
    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(Arc::new(DefaultDecoder), config.resampler.build())
    }

    /// Normalize `blob` to a `target_rate` Hz, `target_channels` WAV file,
    /// running the heavy stages on the blocking thread pool.
    pub async fn normalize(
        &self,
        blob: RawAudioBlob,
        target_rate: u32,
        target_channels: u16,
    ) -> Result<WavFile, NormalizeError> {
        let decoder = Arc::clone(&self.decoder);
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(&blob)).await??;

        let resampler = Arc::clone(&self.resampler);
        let resampled =
            tokio::task::spawn_blocking(move || resampler.resample(&decoded, target_rate))
                .await??;

        tokio::task::spawn_blocking(move || finish(&resampled, target_channels)).await?
    }

    /// Same sequence as [`normalize`](Self::normalize), on the calling thread.
    pub fn normalize_blocking(
        &self,
        blob: &RawAudioBlob,
        target_rate: u32,
        target_channels: u16,
    ) -> Result<WavFile, NormalizeError> {
        let decoded = self.decoder.decode(blob)?;
        let resampled = self.resampler.resample(&decoded, target_rate)?;
        finish(&resampled, target_channels)
    }
}

/// Mix to the output layout and encode.
fn finish(buffer: &AudioBuffer, target_channels: u16) -> Result<WavFile, NormalizeError> {
    let (interleaved, channels) = mix_to(buffer.channels(), target_channels)?;
    Ok(wav::encode(&interleaved, channels, buffer.sample_rate())?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
