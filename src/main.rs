//! Application entry point: voice-classify.
//!
//! # Startup sequence
//!
//! 1. Parse arguments and initialise logging.
//! 2. Load [`AppConfig`] from disk (default on first run) and apply overrides.
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Run the selected command against a [`PipelineOrchestrator`].

mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use voice_classify::{
    audio::{ContentType, RawAudioBlob},
    config::AppConfig,
    pipeline::{new_shared_state, BatchOutcome, Normalizer, PipelineOrchestrator, RunOutcome},
    upload::{Classifier, ClassifyResponse, HttpClassifier},
};

use cli::{Args, Command, RunArgs};

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging(&args);

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load settings, using defaults: {e}");
            AppConfig::default()
        }),
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    match args.command {
        Command::File {
            paths,
            content_type,
            run,
        } => run_file(&rt, config, &paths, content_type.as_deref(), &run),

        #[cfg(feature = "capture")]
        Command::Record { seconds, run } => record::run_record(&rt, config, seconds, &run),

        Command::Config { write } => {
            print!("{}", config.to_toml()?);
            if write {
                match &args.config {
                    Some(path) => config.save_to(path)?,
                    None => config.save()?,
                }
                log::info!("Settings written");
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// file
// ---------------------------------------------------------------------------

fn run_file(
    rt: &tokio::runtime::Runtime,
    mut config: AppConfig,
    paths: &[PathBuf],
    content_type: Option<&str>,
    run: &RunArgs,
) -> Result<()> {
    run.apply(&mut config);

    let mut items = paths
        .iter()
        .map(|path| Ok((load_blob(path, content_type)?, wav_filename(path))))
        .collect::<Result<Vec<_>>>()?;
    let mut orchestrator = build_orchestrator(&config);

    if items.len() == 1 {
        let (blob, filename) = items.remove(0);
        let outcome = rt.block_on(orchestrator.submit(blob, &filename))?;
        return finish_run(&outcome, run);
    }

    let outcome = rt.block_on(orchestrator.submit_batch(items))?;
    finish_batch(&outcome, run)
}

fn load_blob(path: &Path, content_type: Option<&str>) -> Result<RawAudioBlob> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let blob = match content_type {
        Some(ct) => RawAudioBlob::new(bytes, ContentType::parse(ct)),
        None => RawAudioBlob::from_file_bytes(bytes, path),
    };
    log::info!(
        "Loaded {} ({} bytes, {})",
        path.display(),
        blob.len(),
        blob.content_type()
    );
    Ok(blob)
}

/// `clip.mp3` → `clip.wav`.
fn wav_filename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("audio");
    format!("{stem}.wav")
}

// ---------------------------------------------------------------------------
// record
// ---------------------------------------------------------------------------

#[cfg(feature = "capture")]
mod record {
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::{Duration, Instant};

    use anyhow::{anyhow, Context, Result};
    use tokio::sync::mpsc;

    use voice_classify::{
        audio::AudioCapture,
        config::AppConfig,
        pipeline::{new_shared_state, Normalizer, PipelineCommand, PipelineOrchestrator, PipelineState},
    };

    use super::{classifier_for, print_response, RunArgs};

    /// Capture `seconds` of microphone audio through the command channel,
    /// then read the outcome back from shared state.
    pub fn run_record(
        rt: &tokio::runtime::Runtime,
        mut config: AppConfig,
        seconds: f32,
        run: &RunArgs,
    ) -> Result<()> {
        run.apply(&mut config);

        let capture = AudioCapture::new().context("audio capture unavailable")?;
        log::info!(
            "Recording {seconds:.1}s from default input ({} Hz, {} ch)",
            capture.sample_rate(),
            capture.channels()
        );

        let state = new_shared_state(config.clone());
        let orchestrator = PipelineOrchestrator::new(
            state.clone(),
            Normalizer::from_config(&config.audio),
            classifier_for(&config),
        );

        let (command_tx, command_rx) = mpsc::channel::<PipelineCommand>(256);
        let task = rt.spawn(orchestrator.run(command_rx));

        command_tx.blocking_send(PipelineCommand::StartCapture {
            content_type: capture.content_type(),
        })?;

        let (chunk_tx, chunk_rx) = std::sync::mpsc::channel();
        let stream = capture.start(chunk_tx)?;

        let deadline = Instant::now() + Duration::from_secs_f32(seconds.max(0.0));
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match chunk_rx.recv_timeout(remaining) {
                Ok(chunk) => {
                    command_tx.blocking_send(PipelineCommand::Chunk(chunk.to_le_bytes()))?
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        drop(stream);

        command_tx.blocking_send(PipelineCommand::StopCapture)?;
        drop(command_tx);
        rt.block_on(task)?;

        let st = state.lock().map_err(|e| anyhow!("state lock poisoned: {e}"))?;
        match st.pipeline {
            PipelineState::Result => {
                if let Some(len) = st.last_wav_len {
                    println!("wav: {len} bytes");
                }
                if let Some(path) = &st.last_wav_path {
                    println!("saved: {}", path.display());
                }
                if let Some(response) = &st.last_response {
                    print_response(response);
                }
                Ok(())
            }
            _ => Err(anyhow!(
                "{}",
                st.error_message.clone().unwrap_or_else(|| "recording failed".into())
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn classifier_for(config: &AppConfig) -> Option<Arc<dyn Classifier>> {
    config
        .upload
        .enabled
        .then(|| Arc::new(HttpClassifier::from_config(&config.upload)) as Arc<dyn Classifier>)
}

fn build_orchestrator(config: &AppConfig) -> PipelineOrchestrator {
    PipelineOrchestrator::new(
        new_shared_state(config.clone()),
        Normalizer::from_config(&config.audio),
        classifier_for(config),
    )
}

fn finish_run(outcome: &RunOutcome, run: &RunArgs) -> Result<()> {
    if let Some(out) = &run.out {
        std::fs::write(out, outcome.wav.as_bytes())
            .with_context(|| format!("failed to write {}", out.display()))?;
        println!("wrote {} ({:.2}s)", out.display(), outcome.wav.duration_secs());
    }
    if let Some(path) = &outcome.saved_to {
        println!("saved: {}", path.display());
    }
    if let Some(response) = &outcome.response {
        print_response(response);
    }
    Ok(())
}

/// Like [`finish_run`], with `--out` naming a directory.
fn finish_batch(outcome: &BatchOutcome, run: &RunArgs) -> Result<()> {
    if let Some(dir) = &run.out {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    for file in &outcome.files {
        if let Some(dir) = &run.out {
            let out = dir.join(&file.filename);
            std::fs::write(&out, file.wav.as_bytes())
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("wrote {} ({:.2}s)", out.display(), file.wav.duration_secs());
        }
        if let Some(path) = &file.saved_to {
            println!("saved: {}", path.display());
        }
    }
    if let Some(response) = &outcome.response {
        print_response(response);
    }
    Ok(())
}

fn print_response(response: &ClassifyResponse) {
    for p in &response.predictions {
        match &p.filename {
            Some(name) => println!("{name}: {} ({:.1}%)", p.label, p.confidence * 100.0),
            None => println!("{} ({:.1}%)", p.label, p.confidence * 100.0),
        }
    }
    for f in &response.failures {
        println!(
            "{}: error: {}",
            f.filename.as_deref().unwrap_or("?"),
            f.error
        );
    }
    if let Some(eer) = &response.eer {
        println!("EER: {eer}");
    }
}
