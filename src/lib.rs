//! Audio normalization and classification upload.
//!
//! Raw captured or uploaded audio is decoded, resampled to 16 kHz, mixed to
//! the target channel layout and encoded as a 16-bit PCM WAV file, which can
//! then be posted to a classification service.

pub mod audio;
pub mod config;
pub mod pipeline;
pub mod upload;
pub mod wav;
