//! Convergence state machine
//!
//! A synchronous reducer over capture-result observations. The collaborator
//! calls [`ConvergenceMachine::start`] when it issues the AF lock request and
//! then feeds every capture result, in arrival order, to
//! [`ConvergenceMachine::on_observation`] until a terminal result comes back.
//!
//! The machine owns no I/O and never blocks.

use crate::convergence::state::ConvergenceState;
use crate::errors::{ConvergeError, Result};
use crate::types::{AeState, AfState, Observation, TerminalReason, TerminalReport, TransitionResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Consecutive repeats of one non-passive AF state tolerated before giving up
pub const DEFAULT_STALL_THRESHOLD: u32 = 20;

/// State machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Stall guard: repeats of the same non-passive AF state that end the session
    pub stall_threshold: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            stall_threshold: DEFAULT_STALL_THRESHOLD,
        }
    }
}

/// Single-session convergence context
#[derive(Debug, Clone)]
pub struct ConvergenceMachine {
    config: MachineConfig,
    state: ConvergenceState,
    same_state_count: u32,
    previous_af_state: Option<AfState>,
    /// Set once a terminal result has been returned for the current session
    terminated: bool,
    observations: usize,
    last_report: Option<TerminalReport>,
}

impl ConvergenceMachine {
    /// Create a dormant machine with default configuration
    pub fn new() -> Self {
        Self::with_config(MachineConfig::default())
    }

    /// Create a dormant machine with custom configuration
    pub fn with_config(config: MachineConfig) -> Self {
        Self {
            config,
            state: ConvergenceState::Init,
            same_state_count: 0,
            previous_af_state: None,
            terminated: false,
            observations: 0,
            last_report: None,
        }
    }

    /// Begin a lock session.
    ///
    /// The collaborator issues the hardware lock request together with this
    /// call. Calling it mid-session abandons the running session.
    pub fn start(&mut self, focus_region_count: usize) -> Result<()> {
        if focus_region_count == 0 {
            return Err(ConvergeError::NoFocusRegions);
        }

        self.reset_session(ConvergenceState::WaitingLock);
        debug!(regions = focus_region_count, "AF lock session started");
        Ok(())
    }

    /// Begin a pre-capture metering session.
    ///
    /// This is the external trigger path; nothing inside the machine calls it.
    pub fn start_precapture(&mut self) {
        self.reset_session(ConvergenceState::WaitingPreCapture);
        debug!("pre-capture session started");
    }

    fn reset_session(&mut self, state: ConvergenceState) {
        self.state = state;
        self.same_state_count = 0;
        self.previous_af_state = None;
        self.terminated = false;
        self.observations = 0;
        self.last_report = None;
    }

    /// Process one capture-result observation
    pub fn on_observation(&mut self, obs: &Observation, cancel_requested: bool) -> TransitionResult {
        match self.state {
            ConvergenceState::Init => {
                if self.terminated {
                    warn!("observation delivered after session ended; ignoring");
                    TransitionResult::ListenerError
                } else {
                    TransitionResult::Continue
                }
            }
            ConvergenceState::WaitingLock => {
                self.observations += 1;
                self.on_waiting_lock(obs, cancel_requested)
            }
            ConvergenceState::WaitingPreCapture => {
                self.observations += 1;
                self.on_waiting_precapture(obs)
            }
            ConvergenceState::WaitingNonPreCapture => {
                self.observations += 1;
                self.on_waiting_non_precapture(obs)
            }
        }
    }

    fn on_waiting_lock(&mut self, obs: &Observation, cancel_requested: bool) -> TransitionResult {
        let af_state = match obs.af_state {
            Some(af_state) => af_state,
            None => {
                warn!("capture result carried no AF state");
                return self.finish(TerminalReason::MissingAfState, None);
            }
        };

        // Lock check takes priority over the stall check on the same event.
        if af_state.is_locked() {
            info!(af_state = %af_state, ae_state = ?obs.ae_state, "AF locked");
            if cancel_requested {
                return self.finish(TerminalReason::Cancelled, Some(af_state));
            }
            if matches!(obs.ae_state, None | Some(AeState::Converged)) {
                return self.finish(TerminalReason::LockSettled, Some(af_state));
            }
        }

        if af_state != AfState::PassiveScan && Some(af_state) == self.previous_af_state {
            self.same_state_count += 1;
            if self.same_state_count >= self.config.stall_threshold {
                warn!(
                    af_state = %af_state,
                    repeats = self.same_state_count,
                    "AF state stalled"
                );
                return self.finish(TerminalReason::Stalled, Some(af_state));
            }
        } else {
            self.same_state_count = 0;
        }
        self.previous_af_state = Some(af_state);

        TransitionResult::Continue
    }

    fn on_waiting_precapture(&mut self, obs: &Observation) -> TransitionResult {
        debug!(ae_state = ?obs.ae_state, "waiting for pre-capture start");
        match obs.ae_state {
            None | Some(AeState::Precapture) | Some(AeState::FlashRequired) => {
                self.set_state(ConvergenceState::WaitingNonPreCapture);
                TransitionResult::Continue
            }
            Some(AeState::Converged) => self.finish(TerminalReason::ExposureConverged, obs.af_state),
            Some(_) => TransitionResult::Continue,
        }
    }

    fn on_waiting_non_precapture(&mut self, obs: &Observation) -> TransitionResult {
        debug!(ae_state = ?obs.ae_state, "waiting for pre-capture end");
        match obs.ae_state {
            Some(AeState::Precapture) => TransitionResult::Continue,
            _ => self.finish(TerminalReason::PrecaptureFinished, obs.af_state),
        }
    }

    fn finish(&mut self, reason: TerminalReason, af_state: Option<AfState>) -> TransitionResult {
        let report = TerminalReport::new(reason, af_state, self.observations);
        self.set_state(ConvergenceState::Init);
        self.terminated = true;
        self.last_report = Some(report);
        info!(
            outcome = %report.outcome,
            reason = %report.reason,
            observations = report.observations,
            "convergence session ended"
        );
        TransitionResult::Terminal(report)
    }

    fn set_state(&mut self, next: ConvergenceState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "no observation edge from {} to {}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Current state
    pub fn state(&self) -> ConvergenceState {
        self.state
    }

    /// Consecutive repeats of the current non-passive AF state
    pub fn same_state_count(&self) -> u32 {
        self.same_state_count
    }

    /// AF state seen on the previous lock-phase observation
    pub fn previous_af_state(&self) -> Option<AfState> {
        self.previous_af_state
    }

    /// Whether the current session has already returned its terminal result
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Observations processed in the current session
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Terminal report of the current session, once ended
    pub fn last_report(&self) -> Option<&TerminalReport> {
        self.last_report.as_ref()
    }

    /// Get configuration
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }
}

impl Default for ConvergenceMachine {
    fn default() -> Self {
        Self::new()
    }
}
