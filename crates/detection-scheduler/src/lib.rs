//! Detection Scheduler
//!
//! Drives the periodic capture → detect → filter → render cycle and owns the
//! model lifecycle:
//!
//! `Idle → Loading → Ready → Detecting ⇄ Ready(paused) → Stopped`
//!
//! The scheduler runs as a single async task controlled through a
//! [`SchedulerHandle`]; status snapshots are published on a watch channel.

mod config;
mod fps;
mod scheduler;
mod state;
mod status;

pub use config::{interval_ms, SchedulerConfig, MIN_INTERVAL_MS};
pub use fps::FpsMeter;
pub use scheduler::{DetectionScheduler, SchedulerCommand, SchedulerHandle};
pub use state::{Phase, SchedulerState};
pub use status::PipelineStatus;

use thiserror::Error;

/// Scheduler error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Invalid phase transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("Scheduler is no longer running")]
    ChannelClosed,
}
