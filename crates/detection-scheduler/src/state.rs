//! Scheduler phase state machine

use crate::SchedulerError;
use model_adapter::ModelHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Loop phase
///
/// `Idle → Loading → Ready → Detecting ⇄ Ready(paused) → Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loading,
    Ready { paused: bool },
    Detecting,
    Stopped,
}

impl Phase {
    /// Whether `self → next` is a single legal step
    pub fn can_transition_to(&self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Idle, Loading)
                | (Idle, Stopped)
                | (Loading, Ready { paused: false })
                | (Loading, Idle)
                | (Ready { .. }, Detecting)
                | (Ready { .. }, Loading)
                | (Ready { .. }, Stopped)
                | (Detecting, Ready { paused: true })
        )
    }

    pub fn is_detecting(&self) -> bool {
        matches!(self, Phase::Detecting)
    }

    pub fn has_model(&self) -> bool {
        matches!(self, Phase::Ready { .. } | Phase::Detecting)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Loading => write!(f, "loading"),
            Phase::Ready { paused: false } => write!(f, "ready"),
            Phase::Ready { paused: true } => write!(f, "ready (paused)"),
            Phase::Detecting => write!(f, "detecting"),
            Phase::Stopped => write!(f, "stopped"),
        }
    }
}

/// Single-writer loop state, owned by the run loop
#[derive(Debug)]
pub struct SchedulerState {
    phase: Phase,
    /// Loaded model, present in `Ready` and `Detecting`
    pub model: Option<ModelHandle>,
    pub interval_ms: u64,
    pub last_frame_at: Option<u64>,
    /// A detection is running; ticks are skipped until it completes
    pub in_flight: bool,
    /// Bumped whenever in-flight results must be discarded
    pub generation: u64,
    /// Whether to re-enter `Detecting` after the pending load
    pub resume_detecting: bool,
}

impl SchedulerState {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            phase: Phase::Idle,
            model: None,
            interval_ms,
            last_frame_at: None,
            in_flight: false,
            generation: 0,
            resume_detecting: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move one step through the state machine
    pub fn transition(&mut self, next: Phase) -> Result<(), SchedulerError> {
        if !self.phase.can_transition_to(next) {
            return Err(SchedulerError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        debug!("Scheduler phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Invalidate any in-flight cycle
    pub fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}
