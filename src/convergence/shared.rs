//! Lock-guarded machine for callback-style delivery
//!
//! Platform capture callbacks fire on a background thread while the session
//! is started and cancelled from elsewhere. `SharedMachine` keeps the
//! machine behind a single mutex and the cancel request in an atomic, so the
//! canceling thread never waits on the delivery thread.

use crate::convergence::cancel::CancelFlag;
use crate::convergence::machine::{ConvergenceMachine, MachineConfig};
use crate::convergence::state::ConvergenceState;
use crate::errors::Result;
use crate::types::{Observation, TerminalReport, TransitionResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Convergence machine shared between the session owner and the capture callback
#[derive(Debug, Clone)]
pub struct SharedMachine {
    machine: Arc<Mutex<ConvergenceMachine>>,
    cancel: CancelFlag,
}

impl SharedMachine {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            machine: Arc::new(Mutex::new(ConvergenceMachine::with_config(config))),
            cancel: CancelFlag::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConvergenceMachine> {
        // Machine is consistent between observations; poisoning is recoverable.
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a lock session and clear any stale cancel request
    pub fn start(&self, focus_region_count: usize) -> Result<()> {
        let mut machine = self.lock();
        machine.start(focus_region_count)?;
        self.cancel.reset();
        Ok(())
    }

    /// Start a pre-capture metering session
    pub fn start_precapture(&self) {
        let mut machine = self.lock();
        machine.start_precapture();
        self.cancel.reset();
    }

    /// Capture-completed callback body
    pub fn on_capture_completed(&self, obs: &Observation) -> TransitionResult {
        let cancel_requested = self.cancel.is_cancelled();
        self.lock().on_observation(obs, cancel_requested)
    }

    /// Handle for requesting cancellation from any thread
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn state(&self) -> ConvergenceState {
        self.lock().state()
    }

    pub fn last_report(&self) -> Option<TerminalReport> {
        self.lock().last_report().copied()
    }
}

impl Default for SharedMachine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AeState, AfState, TerminalReason};
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_callback_thread_reaches_terminal() {
        let shared = SharedMachine::default();
        shared.start(1).unwrap();

        let callback = shared.clone();
        let handle = thread::spawn(move || {
            let feed = [
                Observation::af(AfState::PassiveScan),
                Observation::af(AfState::ActiveScan),
                Observation::both(AfState::FocusedLocked, AeState::Converged),
            ];
            feed.iter()
                .map(|obs| callback.on_capture_completed(obs))
                .find(|result| result.is_terminal())
        });

        let terminal = handle.join().unwrap().unwrap();
        assert_eq!(terminal.report().unwrap().reason, TerminalReason::LockSettled);
        assert_eq!(shared.state(), ConvergenceState::Init);
        assert!(shared.last_report().unwrap().focus_locked());
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let shared = SharedMachine::default();
        shared.start(1).unwrap();
        let searching = Observation::both(AfState::FocusedLocked, AeState::Searching);
        assert_eq!(shared.on_capture_completed(&searching), TransitionResult::Continue);

        let (tx, rx) = mpsc::channel();
        let cancel = shared.cancel_flag();
        thread::spawn(move || {
            cancel.cancel();
            tx.send(()).unwrap();
        });
        rx.recv().unwrap();

        let result = shared.on_capture_completed(&searching);
        assert_eq!(result.report().unwrap().reason, TerminalReason::Cancelled);
    }

    #[test]
    fn test_start_clears_stale_cancel() {
        let shared = SharedMachine::default();
        shared.cancel_flag().cancel();
        shared.start(1).unwrap();
        assert!(!shared.cancel_flag().is_cancelled());
    }
}
