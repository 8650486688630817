//! One recording, from start to stop or cancel.
//!
//! A [`CaptureSession`] is created when capture starts and consumed when it
//! ends.  Nothing survives between recordings: `finish` hands the blob out,
//! `cancel` (or a plain drop) releases the partial capture.

use std::time::{Duration, Instant};

use crate::audio::{CaptureBuffer, CaptureError, ContentType, RawAudioBlob};

pub struct CaptureSession {
    buffer: CaptureBuffer,
    content_type: ContentType,
    started: Instant,
}

impl CaptureSession {
    /// Begin a session whose chunks will be tagged `content_type`.
    /// `max_bytes == 0` means unbounded.
    pub fn start(content_type: ContentType, max_bytes: usize) -> Self {
        let buffer = if max_bytes == 0 {
            CaptureBuffer::new()
        } else {
            CaptureBuffer::with_limit(max_bytes)
        };
        Self {
            buffer,
            content_type,
            started: Instant::now(),
        }
    }

    pub fn push_chunk(&mut self, chunk: Vec<u8>) -> Result<(), CaptureError> {
        self.buffer.push(chunk)
    }

    /// Bytes captured so far.
    pub fn captured_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// End the session and produce the captured blob.
    pub fn finish(self) -> RawAudioBlob {
        self.buffer.into_blob(self.content_type)
    }

    /// End the session and discard everything.
    pub fn cancel(self) {
        log::debug!(
            "session: cancelled after {:.2}s, dropping {} bytes",
            self.elapsed().as_secs_f32(),
            self.buffer.len()
        );
    }
}
