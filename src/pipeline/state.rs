//! Pipeline state machine and shared application state.
//!
//! [`PipelineState`] is what a front end reads to decide which controls to
//! enable.  [`AppState`] holds it together with the last result, and
//! [`SharedState`] is the `Arc<Mutex<…>>` handle passed around.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::upload::ClassifyResponse;

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// States of the capture → normalize → classify flow.
///
/// ```text
/// Idle ──start──▶ Recording ──stop──▶ Normalizing ──▶ Uploading ──▶ Result
///      ──submit file──────────────▶ Normalizing
/// Normalizing ──upload disabled──▶ Result
/// Recording ──cancel──▶ Idle
/// any state ──error──▶ Error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Nothing in flight.
    #[default]
    Idle,

    /// A capture session is accumulating chunks.
    Recording,

    /// Decode → resample → interleave → encode is running.
    Normalizing,

    /// The WAV file is being sent to the classifier.
    Uploading,

    /// The last run finished.
    Result,

    /// The last run failed; the message is in [`AppState::error_message`].
    Error,
}

impl PipelineState {
    /// `true` while a run is in flight.  Front ends disable the record and
    /// upload controls while busy, which is what keeps runs from overlapping.
    ///
    /// ```
    /// use voice_classify::pipeline::PipelineState;
    ///
    /// assert!(!PipelineState::Idle.is_busy());
    /// assert!(PipelineState::Recording.is_busy());
    /// assert!(PipelineState::Normalizing.is_busy());
    /// assert!(PipelineState::Uploading.is_busy());
    /// assert!(!PipelineState::Result.is_busy());
    /// assert!(!PipelineState::Error.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::Recording | PipelineState::Normalizing | PipelineState::Uploading
        )
    }

    /// Short label for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Recording => "Recording",
            PipelineState::Normalizing => "Normalizing",
            PipelineState::Uploading => "Uploading",
            PipelineState::Result => "Done",
            PipelineState::Error => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Everything a front end needs to render the current run.
pub struct AppState {
    pub pipeline: PipelineState,

    /// Configuration snapshot used by the orchestrator.
    pub config: AppConfig,

    /// Bytes captured by the active recording.
    pub captured_bytes: usize,

    /// Size in bytes of the last WAV file produced.
    pub last_wav_len: Option<usize>,

    /// Where the last WAV file was saved, when saving is enabled.
    pub last_wav_path: Option<PathBuf>,

    /// Classifier answer for the last run.
    pub last_response: Option<ClassifyResponse>,

    /// Error message to display when `pipeline == PipelineState::Error`.
    pub error_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            pipeline: PipelineState::Idle,
            config,
            captured_bytes: 0,
            last_wav_len: None,
            last_wav_path: None,
            last_response: None,
            error_message: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AppState`].
///
/// Lock for short critical sections only; never hold the guard across an
/// `.await`.
pub type SharedState = Arc<Mutex<AppState>>;

pub fn new_shared_state(config: AppConfig) -> SharedState {
    Arc::new(Mutex::new(AppState::new(config)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
