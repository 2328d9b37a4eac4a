//! Vision Alert Pipeline
//!
//! Wires the video source, model adapter, scheduler, renderer, and alert
//! manager together and runs them until shutdown.

pub mod config;
pub mod demo;
pub mod logging;

pub use self::config::{LogFormat, PipelineConfig};
pub use self::logging::init_logging;

use alerting::{
    AlertManager, AudioEngine, EspeakSpeech, FsClipStore, HeadlessAudioEngine, NoSpeech,
    SpeechSynth,
};
use detection_scheduler::{DetectionScheduler, PipelineStatus, SchedulerError};
use model_adapter::{ModelAdapter, ScriptedBackend};
use overlay::{RasterSurface, SurfaceError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use vision_core::{Clock, SystemClock, TestPatternSource, VideoSource};

/// Pipeline error types
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SurfaceError),

    #[error("Scheduler task failed: {0}")]
    Task(String),

    #[error("Signal handling failed: {0}")]
    Signal(#[from] std::io::Error),
}

fn speech_facility() -> Arc<dyn SpeechSynth> {
    let espeak = EspeakSpeech::new();
    if espeak.is_supported() {
        Arc::new(espeak)
    } else {
        info!("No speech synthesizer found, spoken alerts disabled");
        Arc::new(NoSpeech)
    }
}

/// Default output device, or a silent engine when the host has none
fn audio_engine() -> Arc<dyn AudioEngine> {
    #[cfg(feature = "device-audio")]
    {
        match alerting::DeviceAudioEngine::open_default() {
            Ok(engine) => return Arc::new(engine),
            Err(e) => warn!("Audio alerts will be silent: {}", e),
        }
    }
    #[cfg(not(feature = "device-audio"))]
    {
        warn!("Built without device audio, audio alerts will be silent");
    }
    Arc::new(HeadlessAudioEngine::new())
}

/// Log every published status change until the scheduler goes away
async fn log_status(mut rx: watch::Receiver<PipelineStatus>) {
    let mut last_phase = rx.borrow().phase;
    while rx.changed().await.is_ok() {
        let status = rx.borrow_and_update().clone();
        if status.phase != last_phase {
            info!("Pipeline {} ({})", status.phase, status.variant);
            last_phase = status.phase;
        }
        if let Some(error) = &status.last_error {
            debug!("Last error: {}", error);
        }
        debug!(
            "fps {} objects {} persons {} latency {}ms",
            status.fps, status.object_count, status.person_count, status.detection_latency_ms
        );
    }
}

async fn wait_for_shutdown(run_seconds: Option<u64>) -> Result<(), PipelineError> {
    match run_seconds {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    info!("Run time of {}s elapsed", secs);
                }
                signal = tokio::signal::ctrl_c() => signal?,
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }
    Ok(())
}

/// Run the pipeline until ctrl-c or `run_seconds`, returning the final status
pub async fn run(config: PipelineConfig) -> Result<PipelineStatus, PipelineError> {
    let config = config.normalized();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (width, height) = (config.surface_width, config.surface_height);

    let backend = Arc::new(ScriptedBackend::new(demo::street_scenes(width, height)));
    let adapter = ModelAdapter::new(backend, Arc::clone(&clock));
    let source = TestPatternSource::new(width, height, Arc::clone(&clock));

    let mut surface = RasterSurface::new(width, height);
    if let Some(font) = &config.font_path {
        if let Err(e) = surface.load_font(font) {
            warn!("Overlay text disabled: {}", e);
        }
    }

    let mut alerts = AlertManager::new(
        config.alert_config(),
        audio_engine(),
        speech_facility(),
        Arc::new(FsClipStore::new(&config.asset_dir)),
        Arc::clone(&clock),
    );
    alerts.preload().await;

    let (scheduler, handle) = DetectionScheduler::new(
        config.scheduler_config(),
        adapter,
        Box::new(source),
        surface,
        alerts,
        Arc::clone(&clock),
    );
    let task = tokio::spawn(scheduler.run());
    tokio::spawn(log_status(handle.subscribe()));

    wait_for_shutdown(config.run_seconds).await?;
    info!("Shutting down pipeline");
    handle.shutdown().await?;

    let surface = task
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))??;

    if let Some(path) = &config.snapshot_path {
        let background = TestPatternSource::new(width, height, clock).grab();
        surface.save_png(path, background.as_ref())?;
        info!("Overlay snapshot written to {}", path.display());
    }

    Ok(handle.status())
}
