//! Blob → planar `f32` decoding.
//!
//! [`AudioDecoder`] is the capability seam: the pipeline only knows the
//! trait, so a richer codec backend can replace [`DefaultDecoder`] without
//! touching the stages after it.
//!
//! [`DefaultDecoder`] understands:
//!
//! | Content type | Payload |
//! |--------------|---------|
//! | `audio/wav` (+ aliases) or `RIFF…WAVE` magic | WAV, integer PCM 8–32 bit or 32-bit float |
//! | `audio/pcm; rate=…; channels=…; format=…` | headerless `s16le`, `s16be` or `f32le` |
//! | `audio/l16; rate=…` | headerless `s16be` (RFC 2586 byte order) |

use std::io::Cursor;

use thiserror::Error;

use super::blob::{ContentType, RawAudioBlob};
use super::samples::{AudioBuffer, BufferError};

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Reasons a blob cannot be turned into samples.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The blob holds no bytes.
    #[error("audio blob is empty")]
    Empty,

    /// The payload ends in the middle of a header or sample.
    #[error("audio data is truncated")]
    Truncated,

    /// The content type (or sniffed bytes) is not a supported container.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// A content-type parameter is missing or out of range.
    #[error("invalid audio parameter: {0}")]
    InvalidParameter(String),

    /// The container header is recognised but inconsistent.
    #[error("malformed audio container: {0}")]
    Malformed(String),
}

impl From<hound::Error> for DecodeError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                DecodeError::Truncated
            }
            hound::Error::UnfinishedSample => DecodeError::Truncated,
            hound::Error::Unsupported => {
                DecodeError::UnsupportedFormat("unsupported WAV encoding".into())
            }
            other => DecodeError::Malformed(other.to_string()),
        }
    }
}

impl From<BufferError> for DecodeError {
    fn from(e: BufferError) -> Self {
        DecodeError::Malformed(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// AudioDecoder trait
// ---------------------------------------------------------------------------

/// Turns a [`RawAudioBlob`] into an [`AudioBuffer`].
///
/// Implementations must not mutate the blob and must report an error rather
/// than return an empty buffer for unreadable input.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, blob: &RawAudioBlob) -> Result<AudioBuffer, DecodeError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn AudioDecoder>) {}
};

// ---------------------------------------------------------------------------
// DefaultDecoder
// ---------------------------------------------------------------------------

/// WAV (via `hound`) and headerless PCM decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDecoder;

impl AudioDecoder for DefaultDecoder {
    fn decode(&self, blob: &RawAudioBlob) -> Result<AudioBuffer, DecodeError> {
        if blob.is_empty() {
            return Err(DecodeError::Empty);
        }

        let ct = blob.content_type();
        let bytes = blob.bytes();

        if ct.is_raw_pcm() {
            decode_raw_pcm(bytes, ct)
        } else if ct.is_wav() || looks_like_wav(bytes) {
            decode_wav(bytes)
        } else if ct.is_unspecified() {
            Err(DecodeError::UnsupportedFormat(
                "unrecognised container".into(),
            ))
        } else {
            Err(DecodeError::UnsupportedFormat(ct.essence().to_string()))
        }
    }
}

/// `RIFF????WAVE` magic.
fn looks_like_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Inverse of the encoder's asymmetric quantization: negative values scale
/// by `2^(bits-1)`, non-negative ones by `2^(bits-1) - 1`, so both full-scale
/// codes map back to exactly ±1.0.
fn int_to_f32(v: i32, neg_scale: f32, pos_scale: f32) -> f32 {
    if v < 0 {
        v as f32 / neg_scale
    } else {
        v as f32 / pos_scale
    }
}

// ---------------------------------------------------------------------------
// WAV
// ---------------------------------------------------------------------------

fn decode_wav(bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    if spec.sample_rate == 0 {
        return Err(DecodeError::Malformed("sample rate is zero".into()));
    }
    if spec.channels == 0 {
        return Err(DecodeError::Malformed("channel count is zero".into()));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if bits == 0 || bits > 32 {
                return Err(DecodeError::UnsupportedFormat(format!(
                    "{bits}-bit integer PCM"
                )));
            }
            let neg_scale = (1u64 << (bits - 1)) as f32;
            let pos_scale = neg_scale - 1.0;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| int_to_f32(v, neg_scale, pos_scale)))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    if samples.len() % spec.channels as usize != 0 {
        return Err(DecodeError::Truncated);
    }

    Ok(AudioBuffer::from_interleaved(
        spec.sample_rate,
        spec.channels,
        &samples,
    )?)
}

// ---------------------------------------------------------------------------
// Headerless PCM
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PcmFormat {
    S16Le,
    S16Be,
    F32Le,
}

impl PcmFormat {
    fn parse(s: &str) -> Result<Self, DecodeError> {
        match s.to_ascii_lowercase().as_str() {
            "s16le" => Ok(Self::S16Le),
            "s16be" => Ok(Self::S16Be),
            "f32le" => Ok(Self::F32Le),
            other => Err(DecodeError::InvalidParameter(format!("format={other}"))),
        }
    }

    fn bytes_per_sample(self) -> usize {
        match self {
            Self::S16Le | Self::S16Be => 2,
            Self::F32Le => 4,
        }
    }

    fn read(self, b: &[u8]) -> f32 {
        match self {
            Self::S16Le => int_to_f32(i16::from_le_bytes([b[0], b[1]]).into(), 32_768.0, 32_767.0),
            Self::S16Be => int_to_f32(i16::from_be_bytes([b[0], b[1]]).into(), 32_768.0, 32_767.0),
            Self::F32Le => f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        }
    }
}

fn parse_positive<T>(ct: &ContentType, key: &str, default: Option<T>) -> Result<T, DecodeError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match ct.param(key) {
        Some(raw) => match raw.parse::<T>() {
            Ok(v) if v > T::default() => Ok(v),
            _ => Err(DecodeError::InvalidParameter(format!("{key}={raw}"))),
        },
        None => default.ok_or_else(|| DecodeError::InvalidParameter(format!("missing {key}"))),
    }
}

fn decode_raw_pcm(bytes: &[u8], ct: &ContentType) -> Result<AudioBuffer, DecodeError> {
    let sample_rate: u32 = parse_positive(ct, "rate", None)?;
    let channels: u16 = parse_positive(ct, "channels", Some(1))?;

    let default_format = if ct.essence() == "audio/l16" {
        "s16be"
    } else {
        "s16le"
    };
    let format = PcmFormat::parse(ct.param("format").unwrap_or(default_format))?;

    let frame_bytes = format.bytes_per_sample() * channels as usize;
    if bytes.len() % frame_bytes != 0 {
        return Err(DecodeError::Truncated);
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(format.bytes_per_sample())
        .map(|b| format.read(b))
        .collect();

    Ok(AudioBuffer::from_interleaved(sample_rate, channels, &samples)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
