//! Autofocus session driver
//!
//! Runs one convergence session against an [`ObservationSource`]:
//! 1. Start the machine (lock or pre-capture phase)
//! 2. Feed every observation in arrival order with the current cancel flag
//! 3. Detach the source on the first terminal result
//! 4. Enforce the optional wall-clock timeout

use crate::convergence::{CancelFlag, ConvergenceMachine, ConvergenceState, MachineConfig};
use crate::errors::{ConvergeError, Result};
use crate::session::source::{ObservationSource, Subscription};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::{TerminalReport, TransitionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// Collaborator-side session policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Wall-clock limit per session in milliseconds; 0 disables it
    pub timeout_ms: u64,
    /// Capacity of the observation channel
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            channel_capacity: 32,
        }
    }
}

/// Result of a finished session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    /// Phase the session was started in
    pub phase: ConvergenceState,
    pub report: TerminalReport,
    pub elapsed_ms: u64,
    pub finished_at: DateTime<Utc>,
}

/// Drives convergence sessions on behalf of the camera session
pub struct AutoFocusDriver {
    machine_config: MachineConfig,
    session_config: SessionConfig,
    cancel: CancelFlag,
    telemetry: TelemetryCollector,
}

impl AutoFocusDriver {
    pub fn new(machine_config: MachineConfig, session_config: SessionConfig) -> Self {
        Self {
            machine_config,
            session_config,
            cancel: CancelFlag::new(),
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Share an existing telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Handle for cancelling the running session from another task or thread
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Run an AF lock session over `focus_region_count` regions
    pub async fn run_lock<S: ObservationSource>(
        &self,
        focus_region_count: usize,
        source: S,
    ) -> Result<SessionReport> {
        let mut machine = ConvergenceMachine::with_config(self.machine_config.clone());
        machine.start(focus_region_count)?;
        self.run(machine, source).await
    }

    /// Run a pre-capture metering session
    pub async fn run_precapture<S: ObservationSource>(&self, source: S) -> Result<SessionReport> {
        let mut machine = ConvergenceMachine::with_config(self.machine_config.clone());
        machine.start_precapture();
        self.run(machine, source).await
    }

    async fn run<S: ObservationSource>(
        &self,
        mut machine: ConvergenceMachine,
        source: S,
    ) -> Result<SessionReport> {
        let session_id = Uuid::new_v4();
        let phase = machine.state();
        let started = Instant::now();
        self.cancel.reset();
        self.telemetry.record(TelemetryEvent::SessionStarted {
            session_id,
            state: phase,
            timestamp: started,
        });
        info!(%session_id, state = %phase, "convergence session running");

        let mut subscription = Subscription::new(source);
        let timeout_ms = self.session_config.timeout_ms;

        let fed = if timeout_ms > 0 {
            match tokio::time::timeout(
                Duration::from_millis(timeout_ms),
                self.feed(&mut machine, &mut subscription),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => {
                    subscription.detach();
                    warn!(%session_id, timeout_ms, "convergence session timed out");
                    Err(ConvergeError::Timeout {
                        duration_ms: timeout_ms,
                    })
                }
            }
        } else {
            self.feed(&mut machine, &mut subscription).await
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let report = match fed {
            Ok(report) => report,
            Err(e) => {
                self.telemetry.record(TelemetryEvent::Abandoned {
                    session_id,
                    timed_out: matches!(e, ConvergeError::Timeout { .. }),
                    observations: machine.observations(),
                    duration_ms: elapsed_ms,
                    timestamp: Instant::now(),
                });
                return Err(e);
            }
        };

        self.telemetry.record(TelemetryEvent::Terminal {
            session_id,
            outcome: report.outcome,
            reason: report.reason,
            duration_ms: elapsed_ms,
            timestamp: Instant::now(),
        });

        Ok(SessionReport {
            session_id,
            phase,
            report,
            elapsed_ms,
            finished_at: Utc::now(),
        })
    }

    async fn feed<S: ObservationSource>(
        &self,
        machine: &mut ConvergenceMachine,
        subscription: &mut Subscription<S>,
    ) -> Result<TerminalReport> {
        loop {
            let obs = match subscription.next().await {
                Some(obs) => obs,
                None => {
                    return Err(ConvergeError::SourceClosed {
                        observations: machine.observations(),
                    })
                }
            };

            let before = machine.state();
            let result = machine.on_observation(&obs, self.cancel.is_cancelled());
            let now = Instant::now();

            self.telemetry.record(TelemetryEvent::ObservationProcessed {
                same_state_count: machine.same_state_count(),
                timestamp: now,
            });
            if machine.state() != before {
                self.telemetry.record(TelemetryEvent::StateTransition {
                    from: before,
                    to: machine.state(),
                    timestamp: now,
                });
            }

            match result {
                TransitionResult::Continue => {}
                TransitionResult::Terminal(report) => {
                    subscription.detach();
                    return Ok(report);
                }
                TransitionResult::ListenerError => {
                    self.telemetry
                        .record(TelemetryEvent::ProtocolViolation { timestamp: now });
                }
            }
        }
    }
}

impl Default for AutoFocusDriver {
    fn default() -> Self {
        Self::new(MachineConfig::default(), SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::source::ChannelSource;
    use crate::types::{AeState, AfState, Observation, Outcome, TerminalReason};

    async fn source_with(observations: &[Observation]) -> (tokio::sync::mpsc::Sender<Observation>, ChannelSource) {
        let (sender, source) = ChannelSource::channel(observations.len().max(1) + 1);
        for obs in observations {
            sender.send(*obs).await.unwrap();
        }
        (sender, source)
    }

    #[tokio::test]
    async fn test_lock_session_settles() {
        let driver = AutoFocusDriver::default();
        let (sender, source) = source_with(&[
            Observation::af(AfState::PassiveScan),
            Observation::both(AfState::ActiveScan, AeState::Searching),
            Observation::both(AfState::FocusedLocked, AeState::Converged),
            Observation::af(AfState::PassiveScan),
        ])
        .await;

        let session = driver.run_lock(1, source).await.unwrap();
        assert_eq!(session.report.reason, TerminalReason::LockSettled);
        assert_eq!(session.report.outcome, Outcome::Failure);
        assert_eq!(session.report.observations, 3);

        // Source was detached on the terminal result.
        assert!(sender.send(Observation::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_zero_regions_rejected() {
        let driver = AutoFocusDriver::default();
        let (_sender, source) = source_with(&[]).await;
        let result = driver.run_lock(0, source).await;
        assert!(matches!(result, Err(ConvergeError::NoFocusRegions)));
    }

    #[tokio::test]
    async fn test_source_closed_before_terminal() {
        let driver = AutoFocusDriver::default();
        let (sender, source) = source_with(&[Observation::af(AfState::ActiveScan)]).await;
        drop(sender);

        let result = driver.run_lock(1, source).await;
        assert!(matches!(
            result,
            Err(ConvergeError::SourceClosed { observations: 1 })
        ));

        let stats = driver.telemetry().get_stats();
        assert_eq!(stats.sessions_started, 1);
        assert_eq!(stats.abandoned, 1);
        assert_eq!(stats.timeouts, 0);
        assert_eq!(stats.successes + stats.failures, 0);
    }

    #[tokio::test]
    async fn test_timeout_detaches() {
        let driver = AutoFocusDriver::new(
            MachineConfig::default(),
            SessionConfig {
                timeout_ms: 20,
                channel_capacity: 4,
            },
        );
        let (sender, source) = source_with(&[]).await;

        let result = driver.run_lock(1, source).await;
        assert!(matches!(result, Err(ConvergeError::Timeout { duration_ms: 20 })));
        assert!(sender.send(Observation::default()).await.is_err());

        let stats = driver.telemetry().get_stats();
        assert_eq!(stats.abandoned, 1);
        assert_eq!(stats.timeouts, 1);
        assert!(matches!(
            driver.telemetry().recent_events(1)[0],
            TelemetryEvent::Abandoned { timed_out: true, observations: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_stats_balance_across_sessions() {
        let driver = AutoFocusDriver::new(
            MachineConfig::default(),
            SessionConfig {
                timeout_ms: 20,
                channel_capacity: 4,
            },
        );

        let (_sender, source) = source_with(&[Observation::default()]).await;
        driver.run_lock(1, source).await.unwrap();

        let (sender, source) = source_with(&[Observation::af(AfState::ActiveScan)]).await;
        drop(sender);
        assert!(driver.run_lock(1, source).await.is_err());

        let (_sender, source) = source_with(&[]).await;
        assert!(driver.run_precapture(source).await.is_err());

        let stats = driver.telemetry().get_stats();
        assert_eq!(stats.sessions_started, 3);
        assert_eq!(
            stats.sessions_started,
            stats.successes + stats.failures + stats.abandoned
        );
    }

    #[tokio::test]
    async fn test_cancel_flag_observed() {
        let driver = AutoFocusDriver::default();
        let (sender, source) = ChannelSource::channel(8);
        let cancel = driver.cancel_flag();

        let feeder = tokio::spawn(async move {
            let locked = Observation::both(AfState::FocusedLocked, AeState::Searching);
            sender.send(locked).await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
            let _ = sender.send(locked).await;
        });

        let session = driver.run_lock(1, source).await.unwrap();
        feeder.await.unwrap();
        assert_eq!(session.report.reason, TerminalReason::Cancelled);
    }

    #[tokio::test]
    async fn test_precapture_session() {
        let driver = AutoFocusDriver::default();
        let (_sender, source) = source_with(&[
            Observation::ae(AeState::Searching),
            Observation::ae(AeState::Precapture),
            Observation::ae(AeState::Precapture),
            Observation::ae(AeState::Converged),
        ])
        .await;

        let session = driver.run_precapture(source).await.unwrap();
        assert_eq!(session.report.outcome, Outcome::Success);
        assert_eq!(session.report.reason, TerminalReason::PrecaptureFinished);
        assert_eq!(session.report.observations, 4);
        assert_eq!(session.phase, ConvergenceState::WaitingPreCapture);

        let stats = driver.telemetry().get_stats();
        assert_eq!(stats.sessions_started, 1);
        assert_eq!(stats.observations_processed, 4);
        assert_eq!(stats.state_transitions, 2);
        assert_eq!(stats.successes, 1);
    }
}
