//! Accumulates raw capture chunks into a single [`RawAudioBlob`].
//!
//! The recording device delivers bytes in arbitrarily sized chunks; the
//! buffer keeps them in arrival order and concatenates once at the end of
//! the session.  An optional byte limit bounds memory for runaway captures.
//!
//! # Example
//!
//! ```rust
//! use voice_classify::audio::{CaptureBuffer, ContentType};
//!
//! let mut buf = CaptureBuffer::new();
//! buf.push(vec![1, 2]).unwrap();
//! buf.push(vec![3]).unwrap();
//! let blob = buf.into_blob(ContentType::wav());
//! assert_eq!(blob.bytes(), &[1, 2, 3]);
//! ```

use thiserror::Error;

use super::blob::{ContentType, RawAudioBlob};

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors raised while accumulating capture chunks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Appending the chunk would exceed the configured byte limit.
    #[error("capture limit of {limit} bytes exceeded ({attempted} bytes attempted)")]
    LimitExceeded { limit: usize, attempted: usize },
}

// ---------------------------------------------------------------------------
// CaptureBuffer
// ---------------------------------------------------------------------------

/// Growable list of capture chunks.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    chunks: Vec<Vec<u8>>,
    /// Total bytes across all chunks.
    len: usize,
    limit: Option<usize>,
}

impl CaptureBuffer {
    /// Unbounded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer that refuses chunks once `max_bytes` would be exceeded.
    pub fn with_limit(max_bytes: usize) -> Self {
        Self {
            limit: Some(max_bytes),
            ..Self::default()
        }
    }

    /// Append one chunk.  Empty chunks are accepted and ignored.
    ///
    /// # Errors
    ///
    /// [`CaptureError::LimitExceeded`] when the chunk would push the total
    /// past the limit.  The rejected chunk is not stored.
    pub fn push(&mut self, chunk: Vec<u8>) -> Result<(), CaptureError> {
        if chunk.is_empty() {
            return Ok(());
        }

        let attempted = self.len + chunk.len();
        if let Some(limit) = self.limit {
            if attempted > limit {
                return Err(CaptureError::LimitExceeded { limit, attempted });
            }
        }

        self.len = attempted;
        self.chunks.push(chunk);
        Ok(())
    }

    /// Total bytes captured so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty chunks stored.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Discard everything captured so far.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }

    /// Concatenate all chunks in arrival order and tag the result.
    pub fn into_blob(self, content_type: ContentType) -> RawAudioBlob {
        let mut bytes = Vec::with_capacity(self.len);
        for chunk in self.chunks {
            bytes.extend_from_slice(&chunk);
        }
        RawAudioBlob::new(bytes, content_type)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
