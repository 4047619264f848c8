//! Terminal outcomes and per-observation transition results

use super::sensor::AfState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final signal handed to the collaborator, once per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failure => write!(f, "failure"),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// Capture result carried no AF state (driver/instrumentation fault)
    MissingAfState,
    /// AF locked and AE converged or unreported
    LockSettled,
    /// AF locked while a cancel was pending
    Cancelled,
    /// Same non-passive AF state repeated past the stall threshold
    Stalled,
    /// AE converged before pre-capture metering started
    ExposureConverged,
    /// Pre-capture metering finished
    PrecaptureFinished,
}

impl TerminalReason {
    /// Outcome reported for this reason.
    ///
    /// Every lock-phase ending reports `Failure`, including a settled lock.
    /// Callers that need to know whether focus matched use
    /// [`TerminalReport::focus_locked`].
    pub fn outcome(&self) -> Outcome {
        match self {
            TerminalReason::MissingAfState
            | TerminalReason::LockSettled
            | TerminalReason::Cancelled
            | TerminalReason::Stalled => Outcome::Failure,
            TerminalReason::ExposureConverged | TerminalReason::PrecaptureFinished => {
                Outcome::Success
            }
        }
    }
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminalReason::MissingAfState => "AF state missing from capture result",
            TerminalReason::LockSettled => "focus lock settled",
            TerminalReason::Cancelled => "cancelled after lock",
            TerminalReason::Stalled => "AF state stalled",
            TerminalReason::ExposureConverged => "exposure converged",
            TerminalReason::PrecaptureFinished => "pre-capture metering finished",
        };
        write!(f, "{}", s)
    }
}

/// Terminal outcome plus the context it was reached in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalReport {
    pub outcome: Outcome,
    pub reason: TerminalReason,
    /// AF state carried by the observation that ended the session
    pub af_state: Option<AfState>,
    /// Observations processed in the session, including the terminal one
    pub observations: usize,
}

impl TerminalReport {
    pub fn new(reason: TerminalReason, af_state: Option<AfState>, observations: usize) -> Self {
        Self {
            outcome: reason.outcome(),
            reason,
            af_state,
            observations,
        }
    }

    /// Whether the focus motor settled on a matched focus
    pub fn focus_locked(&self) -> bool {
        self.af_state == Some(AfState::FocusedLocked)
    }
}

/// Result of feeding one observation to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Keep observing
    Continue,
    /// Session ended; stop delivering observations
    Terminal(TerminalReport),
    /// Observation arrived after the session already ended; ignored
    ListenerError,
}

impl TransitionResult {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransitionResult::Terminal(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            TransitionResult::Terminal(report) => Some(report.outcome),
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&TerminalReport> {
        match self {
            TransitionResult::Terminal(report) => Some(report),
            _ => None,
        }
    }
}
