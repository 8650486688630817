//! Audio side of the normalization pipeline.
//!
//! # Pipeline
//!
//! ```text
//! capture chunks → CaptureBuffer → RawAudioBlob
//!               → AudioDecoder   → AudioBuffer (native rate, planar f32)
//!               → Resampler      → AudioBuffer (16 kHz)
//!               → mix_to         → interleaved f32 stream
//! ```
//!
//! The last step, PCM/WAV encoding, lives in [`crate::wav`].

pub mod blob;
pub mod buffer;
#[cfg(feature = "capture")]
pub mod capture;
pub mod decode;
pub mod interleave;
pub mod resample;
pub mod samples;

pub use blob::{ContentType, RawAudioBlob};
pub use buffer::{CaptureBuffer, CaptureError};
#[cfg(feature = "capture")]
pub use capture::{AudioCapture, AudioChunk, DeviceError, StreamHandle};
pub use decode::{AudioDecoder, DecodeError, DefaultDecoder};
pub use interleave::{downmix_to_mono, interleave, mix_to, ChannelMismatchError};
pub use resample::{
    output_frame_count, LinearResampler, ResampleError, Resampler, ResamplerKind, SincResampler,
    TARGET_SAMPLE_RATE,
};
pub use samples::{AudioBuffer, BufferError};
