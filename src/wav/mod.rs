//! Canonical PCM WAV output.
//!
//! Every file produced here is a 44-byte RIFF header followed by
//! little-endian signed 16-bit samples, interleaved frame by frame:
//!
//! ```text
//! off size field          value
//!   0   4  "RIFF"
//!   4   4  chunk size     36 + data size
//!   8   4  "WAVE"
//!  12   4  "fmt "
//!  16   4  fmt size       16
//!  20   2  audio format   1 (PCM)
//!  22   2  channels
//!  24   4  sample rate
//!  28   4  byte rate      rate * channels * 2
//!  32   2  block align    channels * 2
//!  34   2  bits/sample    16
//!  36   4  "data"
//!  40   4  data size      samples * 2
//!  44   …  samples
//! ```

pub mod encode;
pub mod header;

pub use encode::{encode, quantize, EncodeError, WavFile};
pub use header::{WavHeader, HEADER_LEN};
