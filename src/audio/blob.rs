//! Opaque captured audio: bytes plus the MIME tag they arrived with.
//!
//! A [`RawAudioBlob`] is what the recording device (or a file picker) hands
//! to the pipeline.  It is never mutated after construction; the decoder only
//! borrows it.

use std::fmt;

// ---------------------------------------------------------------------------
// ContentType
// ---------------------------------------------------------------------------

/// WAV container aliases seen in the wild.
const WAV_ESSENCES: &[&str] = &["audio/wav", "audio/x-wav", "audio/wave", "audio/vnd.wave"];

/// Headerless PCM aliases.  Parameters carry the format.
const RAW_PCM_ESSENCES: &[&str] = &["audio/pcm", "audio/l16"];

/// A parsed MIME content type such as `audio/pcm; rate=48000; channels=2`.
///
/// The essence is lower-cased; parameter keys are lower-cased, values are
/// kept verbatim (minus surrounding quotes).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentType {
    essence: String,
    params: Vec<(String, String)>,
}

impl ContentType {
    /// Parse a MIME string.  Never fails: malformed parameters are skipped
    /// and an empty input yields an empty essence.
    ///
    /// ```rust
    /// use voice_classify::audio::ContentType;
    ///
    /// let ct = ContentType::parse("audio/PCM; rate=48000; channels=\"2\"");
    /// assert_eq!(ct.essence(), "audio/pcm");
    /// assert_eq!(ct.param("rate"), Some("48000"));
    /// assert_eq!(ct.param("channels"), Some("2"));
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(';');
        let essence = parts
            .next()
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_default();

        let params = parts
            .filter_map(|p| {
                let (k, v) = p.split_once('=')?;
                let key = k.trim().to_ascii_lowercase();
                if key.is_empty() {
                    return None;
                }
                let value = v.trim().trim_matches('"').to_string();
                Some((key, value))
            })
            .collect();

        Self { essence, params }
    }

    /// `audio/wav`.
    pub fn wav() -> Self {
        Self::parse("audio/wav")
    }

    /// Headerless little-endian PCM with explicit format parameters.
    pub fn raw_pcm(sample_rate: u32, channels: u16, format: &str) -> Self {
        Self {
            essence: "audio/pcm".into(),
            params: vec![
                ("rate".into(), sample_rate.to_string()),
                ("channels".into(), channels.to_string()),
                ("format".into(), format.to_string()),
            ],
        }
    }

    /// Lower-cased `type/subtype`.
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// Value of the first parameter named `key` (case-insensitive).
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// `true` for any of the WAV container aliases.
    pub fn is_wav(&self) -> bool {
        WAV_ESSENCES.contains(&self.essence.as_str())
    }

    /// `true` for headerless PCM (`audio/pcm`, `audio/l16`).
    pub fn is_raw_pcm(&self) -> bool {
        RAW_PCM_ESSENCES.contains(&self.essence.as_str())
    }

    /// `true` when the tag says nothing useful about the payload, so the
    /// decoder should sniff the bytes instead.
    pub fn is_unspecified(&self) -> bool {
        self.essence.is_empty() || self.essence == "application/octet-stream"
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence)?;
        for (k, v) in &self.params {
            write!(f, "; {k}={v}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RawAudioBlob
// ---------------------------------------------------------------------------

/// Immutable captured audio payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAudioBlob {
    bytes: Vec<u8>,
    content_type: ContentType,
}

impl RawAudioBlob {
    pub fn new(bytes: Vec<u8>, content_type: ContentType) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    /// Guess the content type from a file extension (`.wav`, `.pcm`, …).
    /// Unknown extensions get an unspecified tag and are sniffed at decode time.
    pub fn from_file_bytes(bytes: Vec<u8>, path: &std::path::Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let content_type = match ext.as_deref() {
            Some("wav") | Some("wave") => ContentType::wav(),
            Some(other) => ContentType::parse(&format!("audio/{other}")),
            None => ContentType::default(),
        };

        Self::new(bytes, content_type)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
