//! Vision Alert Pipeline - Main Entry Point

use pipeline::{init_logging, run, PipelineConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = PipelineConfig::load()?;
    init_logging(&config)?;

    info!("=== Vision Alert Pipeline v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Model {} at {} fps, threshold {:.2}, alerts {}",
        config.model_variant,
        config.target_fps,
        config.confidence_threshold,
        if config.alerts_enabled { "on" } else { "off" }
    );

    let status = run(config).await?;
    info!(
        "Pipeline finished after {} cycles ({})",
        status.cycles, status.phase
    );

    Ok(())
}
