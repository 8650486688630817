//! Pipeline orchestrator: drives capture → normalize → save → classify.
//!
//! [`PipelineOrchestrator`] owns the [`SharedState`] and responds to
//! [`PipelineCommand`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Pipeline flow
//!
//! ```text
//! PipelineCommand::StartCapture
//!   └─▶ open CaptureSession, set state = Recording
//!
//! PipelineCommand::Chunk(bytes)
//!   └─▶ append to the session (ignored when not recording)
//!
//! PipelineCommand::StopCapture | SubmitBlob | SubmitBatch
//!   └─▶ Normalizer::normalize (per file)              [Normalizing]
//!         └─▶ save WAV to output dir (optional)
//!         └─▶ classifier.classify[_many] (optional)   [Uploading]
//!               ├─ Ok  → store response               [Result]
//!               └─ Err → error message                [Error]
//!
//! PipelineCommand::Cancel
//!   └─▶ drop the session, set state = Idle
//! ```
//!
//! Commands are handled one at a time, so a new run never starts while the
//! previous one is in flight.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, MutexGuard};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::audio::{CaptureError, ContentType, RawAudioBlob};
use crate::config::AppConfig;
use crate::upload::{Classifier, ClassifyResponse, UploadError};
use crate::wav::WavFile;

use super::normalize::{NormalizeError, Normalizer};
use super::session::CaptureSession;
use super::state::{AppState, PipelineState, SharedState};

/// Name given to WAV files produced from a live capture.
pub const RECORDED_FILENAME: &str = "recorded-audio.wav";

// ---------------------------------------------------------------------------
// PipelineCommand
// ---------------------------------------------------------------------------

/// Input events for the orchestrator.
#[derive(Debug)]
pub enum PipelineCommand {
    /// Open a capture session whose chunks are tagged `content_type`.
    StartCapture { content_type: ContentType },
    /// Raw bytes from the capture source.
    Chunk(Vec<u8>),
    /// Close the session and run the captured blob through the pipeline.
    StopCapture,
    /// Close the session and discard everything.
    Cancel,
    /// Run an already complete blob (e.g. a file from disk).
    SubmitBlob { blob: RawAudioBlob, filename: String },
    /// Run several complete blobs and classify them in one request.
    SubmitBatch { items: Vec<(RawAudioBlob, String)> },
}

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("{} failed: {}", .0.stage(), .0)]
    Normalize(#[from] NormalizeError),

    /// A file in a batch failed to normalize.
    #[error("{filename}: {} failed: {source}", .source.stage())]
    InFile {
        filename: String,
        source: NormalizeError,
    },

    #[error("could not save {path}: {message}")]
    Save { path: PathBuf, message: String },

    #[error(transparent)]
    Upload(#[from] UploadError),
}

// ---------------------------------------------------------------------------
// RunOutcome
// ---------------------------------------------------------------------------

/// Everything one successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub wav: WavFile,
    /// Where the WAV file was written, when saving is enabled.
    pub saved_to: Option<PathBuf>,
    /// Classifier answer, when upload is enabled.
    pub response: Option<ClassifyResponse>,
}

/// One normalized file of a batch.
#[derive(Debug, Clone)]
pub struct NormalizedFile {
    pub filename: String,
    pub wav: WavFile,
    pub saved_to: Option<PathBuf>,
}

/// Everything one successful batch run produced.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Normalized files, in submission order.
    pub files: Vec<NormalizedFile>,
    /// One answer covering every file, when upload is enabled.
    pub response: Option<ClassifyResponse>,
}

/// Total WAV bytes, last saved path and response of a finished run.
type RunSummary = (usize, Option<PathBuf>, Option<ClassifyResponse>);

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Drives the complete capture-to-classification flow.
///
/// Create with [`PipelineOrchestrator::new`], then call [`run`](Self::run)
/// inside a tokio task, or call [`submit`](Self::submit) directly for a
/// one-shot run.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_classify::config::AppConfig;
/// use voice_classify::pipeline::{new_shared_state, Normalizer, PipelineOrchestrator};
/// use voice_classify::upload::{Classifier, HttpClassifier};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let shared_state = new_shared_state(config.clone());
/// let classifier: Arc<dyn Classifier> = Arc::new(HttpClassifier::from_config(&config.upload));
///
/// let (tx, rx) = tokio::sync::mpsc::channel(64);
/// let orchestrator = PipelineOrchestrator::new(
///     shared_state,
///     Normalizer::from_config(&config.audio),
///     Some(classifier),
/// );
/// tokio::spawn(orchestrator.run(rx));
/// # drop(tx);
/// # }
/// ```
pub struct PipelineOrchestrator {
    state: SharedState,
    normalizer: Normalizer,
    classifier: Option<Arc<dyn Classifier>>,
    session: Option<CaptureSession>,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator.
    ///
    /// * `state`      — shared application state, also read by front ends.
    /// * `normalizer` — decode/resample/encode stages.
    /// * `classifier` — `None` disables the upload step regardless of config.
    pub fn new(
        state: SharedState,
        normalizer: Normalizer,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Self {
        Self {
            state,
            normalizer,
            classifier,
            session: None,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `command_rx` is closed.  A session still open at that point
    /// is discarded.
    pub async fn run(mut self, mut command_rx: mpsc::Receiver<PipelineCommand>) {
        while let Some(command) = command_rx.recv().await {
            self.handle(command).await;
        }

        if let Some(session) = self.session.take() {
            session.cancel();
        }
        log::info!("pipeline: command channel closed, orchestrator shutting down");
    }

    async fn handle(&mut self, command: PipelineCommand) {
        match command {
            PipelineCommand::StartCapture { content_type } => self.handle_start(content_type),
            PipelineCommand::Chunk(bytes) => self.handle_chunk(bytes),
            PipelineCommand::StopCapture => self.handle_stop().await,
            PipelineCommand::Cancel => self.handle_cancel(),
            PipelineCommand::SubmitBlob { blob, filename } => {
                if self.session.is_some() {
                    log::warn!("pipeline: ignoring submitted blob while recording");
                    return;
                }
                // Errors are recorded in shared state by `submit`.
                let _ = self.submit(blob, &filename).await;
            }
            PipelineCommand::SubmitBatch { items } => {
                if self.session.is_some() {
                    log::warn!("pipeline: ignoring submitted batch while recording");
                    return;
                }
                let _ = self.submit_batch(items).await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    fn handle_start(&mut self, content_type: ContentType) {
        if let Some(previous) = self.session.take() {
            log::warn!("pipeline: capture restarted, discarding previous session");
            previous.cancel();
        }

        log::debug!("pipeline: StartCapture ({content_type}) → Recording");

        let max_bytes = self.lock_state().config.audio.max_capture_bytes;
        self.session = Some(CaptureSession::start(content_type, max_bytes));

        let mut st = self.lock_state();
        st.pipeline = PipelineState::Recording;
        st.captured_bytes = 0;
        st.error_message = None;
    }

    fn handle_chunk(&mut self, bytes: Vec<u8>) {
        let Some(session) = self.session.as_mut() else {
            log::trace!("pipeline: dropping {} bytes received while idle", bytes.len());
            return;
        };

        match session.push_chunk(bytes) {
            Ok(()) => {
                let captured = session.captured_bytes();
                self.lock_state().captured_bytes = captured;
            }
            Err(e) => {
                if let Some(session) = self.session.take() {
                    session.cancel();
                }
                self.set_error(&PipelineError::from(e));
            }
        }
    }

    async fn handle_stop(&mut self) {
        let Some(session) = self.session.take() else {
            log::debug!("pipeline: StopCapture while not recording, ignored");
            return;
        };

        log::debug!(
            "pipeline: StopCapture after {:.2}s, {} bytes",
            session.elapsed().as_secs_f32(),
            session.captured_bytes()
        );

        let blob = session.finish();
        let _ = self.submit(blob, RECORDED_FILENAME).await;
    }

    fn handle_cancel(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel();
        }
        let mut st = self.lock_state();
        st.pipeline = PipelineState::Idle;
        st.captured_bytes = 0;
    }

    // -----------------------------------------------------------------------
    // One run
    // -----------------------------------------------------------------------

    /// Normalize `blob`, then save and classify it as configured.
    ///
    /// Shared state is updated at every step; on failure the error message is
    /// stored there as well as returned.
    pub async fn submit(
        &mut self,
        blob: RawAudioBlob,
        filename: &str,
    ) -> Result<RunOutcome, PipelineError> {
        let result = self.process(blob, filename).await;
        self.finish_run(result.as_ref().map(|o| {
            (o.wav.len(), o.saved_to.clone(), o.response.clone())
        }));
        result
    }

    /// Normalize every blob, save them as configured, then classify them in
    /// one request.  The first file that fails to normalize ends the batch.
    pub async fn submit_batch(
        &mut self,
        items: Vec<(RawAudioBlob, String)>,
    ) -> Result<BatchOutcome, PipelineError> {
        let result = self.process_batch(items).await;
        self.finish_run(result.as_ref().map(|o| {
            (
                o.files.iter().map(|f| f.wav.len()).sum(),
                o.files.iter().rev().find_map(|f| f.saved_to.clone()),
                o.response.clone(),
            )
        }));
        result
    }

    async fn process(
        &self,
        blob: RawAudioBlob,
        filename: &str,
    ) -> Result<RunOutcome, PipelineError> {
        let config = self.begin_run();
        let (wav, saved_to) = self.normalize_and_save(blob, filename, &config).await?;

        let response = match self.upload_target(&config) {
            Some(classifier) => {
                self.set_pipeline(PipelineState::Uploading);
                let response = classifier.classify(&wav, filename).await?;
                log_response(&response);
                Some(response)
            }
            None => None,
        };

        Ok(RunOutcome {
            wav,
            saved_to,
            response,
        })
    }

    async fn process_batch(
        &self,
        items: Vec<(RawAudioBlob, String)>,
    ) -> Result<BatchOutcome, PipelineError> {
        let config = self.begin_run();

        let mut files = Vec::with_capacity(items.len());
        for (blob, filename) in items {
            let (wav, saved_to) = self
                .normalize_and_save(blob, &filename, &config)
                .await
                .map_err(|e| match e {
                    PipelineError::Normalize(source) => PipelineError::InFile {
                        filename: filename.clone(),
                        source,
                    },
                    other => other,
                })?;
            files.push(NormalizedFile {
                filename,
                wav,
                saved_to,
            });
        }

        let response = match self.upload_target(&config) {
            Some(classifier) if !files.is_empty() => {
                self.set_pipeline(PipelineState::Uploading);
                let batch: Vec<(&WavFile, &str)> =
                    files.iter().map(|f| (&f.wav, f.filename.as_str())).collect();
                let response = classifier.classify_many(&batch).await?;
                log_response(&response);
                Some(response)
            }
            _ => None,
        };

        Ok(BatchOutcome { files, response })
    }

    /// Enter `Normalizing` and snapshot the configuration for this run.
    fn begin_run(&self) -> AppConfig {
        let mut st = self.lock_state();
        st.pipeline = PipelineState::Normalizing;
        st.error_message = None;
        st.last_response = None;
        st.config.clone()
    }

    async fn normalize_and_save(
        &self,
        blob: RawAudioBlob,
        filename: &str,
        config: &AppConfig,
    ) -> Result<(WavFile, Option<PathBuf>), PipelineError> {
        let input_len = blob.len();
        let wav = self
            .normalizer
            .normalize(
                blob,
                config.audio.target_sample_rate,
                config.audio.target_channels,
            )
            .await?;

        log::info!(
            "pipeline: normalized {input_len} bytes of '{filename}' into {:.2}s of {} Hz audio ({} bytes)",
            wav.duration_secs(),
            wav.sample_rate(),
            wav.len()
        );

        let saved_to = if config.output.save_wav {
            Some(save_wav(&wav, config.output.resolved_dir(), filename).await?)
        } else {
            None
        };
        Ok((wav, saved_to))
    }

    /// The classifier to use, or `None` when uploading is off.
    fn upload_target(&self, config: &AppConfig) -> Option<&Arc<dyn Classifier>> {
        match (&self.classifier, config.upload.enabled) {
            (Some(classifier), true) => Some(classifier),
            _ => {
                log::debug!("pipeline: upload disabled, skipping classification");
                None
            }
        }
    }

    /// Record the end of a run in shared state: `Result` with the WAV size,
    /// saved path and response, or `Error` with the message.
    fn finish_run(&self, result: Result<RunSummary, &PipelineError>) {
        match result {
            Ok((wav_len, saved_to, response)) => {
                let mut st = self.lock_state();
                st.pipeline = PipelineState::Result;
                st.last_wav_len = Some(wav_len);
                st.last_wav_path = saved_to;
                st.last_response = response;
            }
            Err(e) => self.set_error(e),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_pipeline(&self, state: PipelineState) {
        self.lock_state().pipeline = state;
    }

    fn set_error(&self, error: &PipelineError) {
        let message = error.to_string();
        log::error!("pipeline error: {message}");
        let mut st = self.lock_state();
        st.pipeline = PipelineState::Error;
        st.error_message = Some(message);
    }
}

/// Write `wav` to `dir/<name>`, creating `dir` if needed.  Only the final
/// component of `filename` is used, so the file always lands inside `dir`.
async fn save_wav(wav: &WavFile, dir: PathBuf, filename: &str) -> Result<PathBuf, PipelineError> {
    let name = Path::new(filename)
        .file_name()
        .unwrap_or_else(|| OsStr::new(RECORDED_FILENAME));
    let path = dir.join(name);
    let save_err = |e: std::io::Error| PipelineError::Save {
        path: path.clone(),
        message: e.to_string(),
    };

    tokio::fs::create_dir_all(&dir).await.map_err(save_err)?;
    tokio::fs::write(&path, wav.as_bytes()).await.map_err(save_err)?;
    log::info!("pipeline: saved {}", path.display());
    Ok(path)
}

fn log_response(response: &ClassifyResponse) {
    for p in &response.predictions {
        log::info!(
            "pipeline: {} → {} ({:.1}%)",
            p.filename.as_deref().unwrap_or("-"),
            p.label,
            p.confidence * 100.0
        );
    }
    for f in &response.failures {
        log::warn!(
            "pipeline: classifier could not process {}: {}",
            f.filename.as_deref().unwrap_or("-"),
            f.error
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{DecodeError, DefaultDecoder, LinearResampler};
    use crate::pipeline::state::new_shared_state;
    use crate::upload::Prediction;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Answers every request with a fixed label and records what it saw.
    struct OkClassifier {
        seen: Mutex<Vec<(String, u32, u16)>>,
    }

    impl OkClassifier {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Classifier for OkClassifier {
        async fn classify(
            &self,
            wav: &WavFile,
            filename: &str,
        ) -> Result<ClassifyResponse, UploadError> {
            self.seen.lock().unwrap().push((
                filename.to_string(),
                wav.sample_rate(),
                wav.channel_count(),
            ));
            Ok(ClassifyResponse {
                predictions: vec![Prediction {
                    filename: Some(filename.to_string()),
                    label: "Genuine".into(),
                    confidence: 0.875,
                }],
                ..ClassifyResponse::default()
            })
        }
    }

    struct FailClassifier;

    #[async_trait]
    impl Classifier for FailClassifier {
        async fn classify(
            &self,
            _wav: &WavFile,
            _filename: &str,
        ) -> Result<ClassifyResponse, UploadError> {
            Err(UploadError::Timeout)
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn make_orchestrator(
        config: AppConfig,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> (PipelineOrchestrator, SharedState) {
        let state = new_shared_state(config);
        let normalizer = Normalizer::new(Arc::new(DefaultDecoder), Arc::new(LinearResampler));
        let orc = PipelineOrchestrator::new(Arc::clone(&state), normalizer, classifier);
        (orc, state)
    }

    fn s16le_ct() -> ContentType {
        ContentType::raw_pcm(48_000, 2, "s16le")
    }

    /// `frames` stereo frames of a quiet square wave, s16le.
    fn stereo_chunk(frames: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(frames * 4);
        for i in 0..frames {
            let v: i16 = if (i / 24) % 2 == 0 { 1_000 } else { -1_000 };
            out.extend_from_slice(&v.to_le_bytes());
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    async fn run_commands(orc: PipelineOrchestrator, commands: Vec<PipelineCommand>) {
        let (tx, rx) = mpsc::channel(commands.len().max(1));
        for c in commands {
            tx.send(c).await.unwrap();
        }
        drop(tx);
        orc.run(rx).await;
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn start_sets_recording_state() {
        let (orc, state) = make_orchestrator(AppConfig::default(), None);

        run_commands(
            orc,
            vec![
                PipelineCommand::StartCapture {
                    content_type: s16le_ct(),
                },
                PipelineCommand::Chunk(stereo_chunk(480)),
            ],
        )
        .await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Recording);
        assert_eq!(st.captured_bytes, 480 * 4);
    }

    #[tokio::test]
    async fn capture_then_stop_classifies_mono_16k_wav() {
        let classifier = Arc::new(OkClassifier::new());
        let (orc, state) = make_orchestrator(
            AppConfig::default(),
            Some(Arc::clone(&classifier) as Arc<dyn Classifier>),
        );

        run_commands(
            orc,
            vec![
                PipelineCommand::StartCapture {
                    content_type: s16le_ct(),
                },
                PipelineCommand::Chunk(stereo_chunk(24_000)),
                PipelineCommand::Chunk(stereo_chunk(24_000)),
                PipelineCommand::StopCapture,
            ],
        )
        .await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Result);
        // One second at 16 kHz mono, plus the header.
        assert_eq!(st.last_wav_len, Some(44 + 32_000));
        let response = st.last_response.as_ref().unwrap();
        assert_eq!(response.primary().unwrap().label, "Genuine");

        let seen = classifier.seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[(RECORDED_FILENAME.to_string(), 16_000, 1)]
        );
    }

    #[tokio::test]
    async fn stop_with_empty_capture_is_a_decode_error() {
        let (orc, state) = make_orchestrator(AppConfig::default(), None);

        run_commands(
            orc,
            vec![
                PipelineCommand::StartCapture {
                    content_type: s16le_ct(),
                },
                PipelineCommand::StopCapture,
            ],
        )
        .await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Error);
        let message = st.error_message.as_deref().unwrap();
        assert!(message.starts_with("decode failed"), "{message}");
        assert!(message.contains(&DecodeError::Empty.to_string()));
    }

    #[tokio::test]
    async fn chunks_while_idle_are_ignored() {
        let (orc, state) = make_orchestrator(AppConfig::default(), None);

        run_commands(
            orc,
            vec![
                PipelineCommand::Chunk(stereo_chunk(100)),
                PipelineCommand::StopCapture,
            ],
        )
        .await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Idle);
        assert_eq!(st.captured_bytes, 0);
    }

    #[tokio::test]
    async fn cancel_discards_capture() {
        let classifier = Arc::new(OkClassifier::new());
        let (orc, state) = make_orchestrator(
            AppConfig::default(),
            Some(Arc::clone(&classifier) as Arc<dyn Classifier>),
        );

        run_commands(
            orc,
            vec![
                PipelineCommand::StartCapture {
                    content_type: s16le_ct(),
                },
                PipelineCommand::Chunk(stereo_chunk(4_800)),
                PipelineCommand::Cancel,
                PipelineCommand::StopCapture,
            ],
        )
        .await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Idle);
        assert!(st.last_response.is_none());
        assert!(classifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn capture_limit_ends_the_session() {
        let mut config = AppConfig::default();
        config.audio.max_capture_bytes = 1_000;
        let (orc, state) = make_orchestrator(config, None);

        run_commands(
            orc,
            vec![
                PipelineCommand::StartCapture {
                    content_type: s16le_ct(),
                },
                PipelineCommand::Chunk(stereo_chunk(200)),
                PipelineCommand::Chunk(stereo_chunk(200)),
            ],
        )
        .await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Error);
        assert!(st.error_message.is_some());
    }

    #[tokio::test]
    async fn classifier_failure_sets_error_state() {
        let (mut orc, state) =
            make_orchestrator(AppConfig::default(), Some(Arc::new(FailClassifier)));

        let blob = RawAudioBlob::new(stereo_chunk(4_800), s16le_ct());
        let err = orc.submit(blob, "clip.wav").await.unwrap_err();
        assert!(matches!(err, PipelineError::Upload(UploadError::Timeout)));

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Error);
        assert!(st.last_response.is_none());
    }

    #[tokio::test]
    async fn upload_disabled_skips_classifier() {
        let classifier = Arc::new(OkClassifier::new());
        let mut config = AppConfig::default();
        config.upload.enabled = false;
        let (mut orc, state) =
            make_orchestrator(config, Some(Arc::clone(&classifier) as Arc<dyn Classifier>));

        let blob = RawAudioBlob::new(stereo_chunk(4_800), s16le_ct());
        let outcome = orc.submit(blob, "clip.wav").await.unwrap();
        assert!(outcome.response.is_none());
        assert_eq!(outcome.wav.frame_count(), 1_600);
        assert!(classifier.seen.lock().unwrap().is_empty());
        assert_eq!(state.lock().unwrap().pipeline, PipelineState::Result);
    }

    #[tokio::test]
    async fn saves_wav_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.upload.enabled = false;
        config.output.save_wav = true;
        config.output.output_dir = Some(dir.path().join("out"));
        let (mut orc, state) = make_orchestrator(config, None);

        let blob = RawAudioBlob::new(stereo_chunk(4_800), s16le_ct());
        let outcome = orc.submit(blob, "clip.wav").await.unwrap();

        let path = outcome.saved_to.unwrap();
        assert_eq!(path, dir.path().join("out").join("clip.wav"));
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, outcome.wav.as_bytes());

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(state.lock().unwrap().last_wav_path.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn save_keeps_files_inside_the_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut config = AppConfig::default();
        config.upload.enabled = false;
        config.output.save_wav = true;
        config.output.output_dir = Some(out.clone());
        let (mut orc, _state) = make_orchestrator(config, None);

        let blob = RawAudioBlob::new(stereo_chunk(4_800), s16le_ct());
        let outcome = orc.submit(blob, "../escape.wav").await.unwrap();
        assert_eq!(outcome.saved_to.as_deref(), Some(out.join("escape.wav").as_path()));
        assert!(!dir.path().join("escape.wav").exists());

        let absolute = dir.path().join("elsewhere").join("abs.wav");
        let blob = RawAudioBlob::new(stereo_chunk(4_800), s16le_ct());
        let outcome = orc.submit(blob, absolute.to_str().unwrap()).await.unwrap();
        assert_eq!(outcome.saved_to.as_deref(), Some(out.join("abs.wav").as_path()));
        assert!(!absolute.exists());

        let blob = RawAudioBlob::new(stereo_chunk(4_800), s16le_ct());
        let outcome = orc.submit(blob, "..").await.unwrap();
        assert_eq!(
            outcome.saved_to.as_deref(),
            Some(out.join(RECORDED_FILENAME).as_path())
        );
    }

    #[tokio::test]
    async fn batch_normalizes_every_file_and_classifies_them_together() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Arc::new(OkClassifier::new());
        let mut config = AppConfig::default();
        config.output.save_wav = true;
        config.output.output_dir = Some(dir.path().to_path_buf());
        let (mut orc, state) =
            make_orchestrator(config, Some(Arc::clone(&classifier) as Arc<dyn Classifier>));

        let items = vec![
            (RawAudioBlob::new(stereo_chunk(4_800), s16le_ct()), "a.wav".to_string()),
            (RawAudioBlob::new(stereo_chunk(9_600), s16le_ct()), "b.wav".to_string()),
        ];
        let outcome = orc.submit_batch(items).await.unwrap();

        let frames: Vec<_> = outcome.files.iter().map(|f| f.wav.frame_count()).collect();
        assert_eq!(frames, [1_600, 3_200]);
        assert!(dir.path().join("a.wav").exists());
        assert!(dir.path().join("b.wav").exists());

        let response = outcome.response.unwrap();
        let labelled: Vec<_> = response
            .predictions
            .iter()
            .map(|p| p.filename.as_deref())
            .collect();
        assert_eq!(labelled, [Some("a.wav"), Some("b.wav")]);
        assert_eq!(
            classifier.seen.lock().unwrap().as_slice(),
            &[("a.wav".to_string(), 16_000, 1), ("b.wav".to_string(), 16_000, 1)]
        );

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Result);
        assert_eq!(st.last_wav_len, Some(44 + 3_200 + 44 + 6_400));
        assert_eq!(st.last_wav_path.as_deref(), Some(dir.path().join("b.wav").as_path()));
    }

    #[tokio::test]
    async fn batch_failure_names_the_file() {
        let classifier = Arc::new(OkClassifier::new());
        let (orc, state) = make_orchestrator(
            AppConfig::default(),
            Some(Arc::clone(&classifier) as Arc<dyn Classifier>),
        );

        run_commands(
            orc,
            vec![PipelineCommand::SubmitBatch {
                items: vec![
                    (RawAudioBlob::new(stereo_chunk(4_800), s16le_ct()), "a.wav".into()),
                    (RawAudioBlob::new(Vec::new(), s16le_ct()), "empty.wav".into()),
                ],
            }],
        )
        .await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Error);
        let message = st.error_message.as_deref().unwrap();
        assert!(message.starts_with("empty.wav: decode failed"), "{message}");
        assert!(classifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_batch_uploads_nothing() {
        let classifier = Arc::new(OkClassifier::new());
        let (mut orc, state) = make_orchestrator(
            AppConfig::default(),
            Some(Arc::clone(&classifier) as Arc<dyn Classifier>),
        );

        let outcome = orc.submit_batch(Vec::new()).await.unwrap();
        assert!(outcome.files.is_empty());
        assert!(outcome.response.is_none());
        assert!(classifier.seen.lock().unwrap().is_empty());
        assert_eq!(state.lock().unwrap().pipeline, PipelineState::Result);
    }

    #[tokio::test]
    async fn submit_while_recording_is_ignored() {
        let classifier = Arc::new(OkClassifier::new());
        let (orc, state) = make_orchestrator(
            AppConfig::default(),
            Some(Arc::clone(&classifier) as Arc<dyn Classifier>),
        );

        run_commands(
            orc,
            vec![
                PipelineCommand::StartCapture {
                    content_type: s16le_ct(),
                },
                PipelineCommand::SubmitBlob {
                    blob: RawAudioBlob::new(stereo_chunk(4_800), s16le_ct()),
                    filename: "clip.wav".into(),
                },
            ],
        )
        .await;

        assert_eq!(state.lock().unwrap().pipeline, PipelineState::Recording);
        assert!(classifier.seen.lock().unwrap().is_empty());
    }
}
