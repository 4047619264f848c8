//! Convergence phases
//!
//! Observation-driven edges (4, plus self-loops):
//! 1. WaitingLock          → Init                 (lock settled, cancel, stall, missing AF)
//! 2. WaitingPreCapture    → WaitingNonPreCapture (AE precapture, flash required or unreported)
//! 3. WaitingPreCapture    → Init                 (AE converged)
//! 4. WaitingNonPreCapture → Init                 (AE left precapture)
//!
//! Entry into WaitingLock and WaitingPreCapture only happens through the
//! session entry points on the machine, never from an observation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Convergence state, exactly one active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConvergenceState {
    /// Idle; both the initial and the terminal state
    #[default]
    Init,

    /// Waiting for AF to lock
    WaitingLock,

    /// Waiting for AE pre-capture metering to start
    WaitingPreCapture,

    /// Waiting for AE pre-capture metering to finish
    WaitingNonPreCapture,
}

impl ConvergenceState {
    /// No session is running in this state
    pub fn is_dormant(&self) -> bool {
        matches!(self, ConvergenceState::Init)
    }

    /// Whether an observation may move the machine from `self` to `next`
    pub fn can_transition_to(&self, next: ConvergenceState) -> bool {
        use ConvergenceState::*;

        matches!(
            (self, next),
            (WaitingLock, Init)
                | (WaitingPreCapture, WaitingNonPreCapture)
                | (WaitingPreCapture, Init)
                | (WaitingNonPreCapture, Init)
        ) || *self == next
    }

    /// Human-readable state name
    pub fn display_name(&self) -> &'static str {
        match self {
            ConvergenceState::Init => "Idle",
            ConvergenceState::WaitingLock => "Waiting for AF lock",
            ConvergenceState::WaitingPreCapture => "Waiting for pre-capture start",
            ConvergenceState::WaitingNonPreCapture => "Waiting for pre-capture end",
        }
    }
}

impl fmt::Display for ConvergenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvergenceState::Init => write!(f, "Init"),
            ConvergenceState::WaitingLock => write!(f, "WaitingLock"),
            ConvergenceState::WaitingPreCapture => write!(f, "WaitingPreCapture"),
            ConvergenceState::WaitingNonPreCapture => write!(f, "WaitingNonPreCapture"),
        }
    }
}
