//! Pipeline: stage sequencing, capture sessions and the orchestrator task.
//!
//! # Architecture
//!
//! ```text
//! PipelineCommand (mpsc)
//!        │
//!        ▼
//! PipelineOrchestrator::run()  ← async tokio task
//!        │
//!        ├─ StartCapture / Chunk → CaptureSession          [Recording]
//!        │
//!        └─ StopCapture / SubmitBlob / SubmitBatch
//!              │
//!              ├─ Normalizer::normalize (decode → resample → mix → WAV)
//!              ├─ save WAV (optional)
//!              └─ Classifier::classify / classify_many (optional)
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── read by the front end
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_classify::audio::{ContentType, RawAudioBlob};
//! use voice_classify::config::AppConfig;
//! use voice_classify::pipeline::{new_shared_state, Normalizer, PipelineOrchestrator};
//!
//! # async fn example(bytes: Vec<u8>) {
//! let config = AppConfig::default();
//! let state = new_shared_state(config.clone());
//! let mut orchestrator =
//!     PipelineOrchestrator::new(state, Normalizer::from_config(&config.audio), None);
//!
//! let blob = RawAudioBlob::new(bytes, ContentType::wav());
//! let outcome = orchestrator.submit(blob, "clip.wav").await.unwrap();
//! println!("{} bytes of 16 kHz WAV", outcome.wav.len());
//! # }
//! ```

pub mod normalize;
pub mod runner;
pub mod session;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use normalize::{NormalizeError, Normalizer};
pub use runner::{
    BatchOutcome, NormalizedFile, PipelineCommand, PipelineError, PipelineOrchestrator,
    RunOutcome, RECORDED_FILENAME,
};
pub use session::CaptureSession;
pub use state::{new_shared_state, AppState, PipelineState, SharedState};
