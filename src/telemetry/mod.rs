//! Session telemetry for afconverge
//!
//! Collects per-session events and running statistics from the driver.

use crate::convergence::ConvergenceState;
use crate::types::{Outcome, TerminalReason};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use uuid::Uuid;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    SessionStarted {
        session_id: Uuid,
        state: ConvergenceState,
        timestamp: Instant,
    },
    StateTransition {
        from: ConvergenceState,
        to: ConvergenceState,
        timestamp: Instant,
    },
    ObservationProcessed {
        same_state_count: u32,
        timestamp: Instant,
    },
    Terminal {
        session_id: Uuid,
        outcome: Outcome,
        reason: TerminalReason,
        duration_ms: u64,
        timestamp: Instant,
    },
    /// Session ended without a terminal result (source closed or timed out)
    Abandoned {
        session_id: Uuid,
        timed_out: bool,
        observations: usize,
        duration_ms: u64,
        timestamp: Instant,
    },
    /// Observation delivered after the session already ended
    ProtocolViolation {
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub sessions_started: usize,
    pub observations_processed: usize,
    pub state_transitions: usize,
    pub successes: usize,
    pub failures: usize,
    pub stalls: usize,
    pub cancellations: usize,
    pub abandoned: usize,
    pub timeouts: usize,
    pub protocol_violations: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::SessionStarted { .. } => {
                    stats.sessions_started += 1;
                }
                TelemetryEvent::StateTransition { .. } => {
                    stats.state_transitions += 1;
                }
                TelemetryEvent::ObservationProcessed { .. } => {
                    stats.observations_processed += 1;
                }
                TelemetryEvent::Terminal { outcome, reason, .. } => {
                    if outcome.is_success() {
                        stats.successes += 1;
                    } else {
                        stats.failures += 1;
                    }
                    match reason {
                        TerminalReason::Stalled => stats.stalls += 1,
                        TerminalReason::Cancelled => stats.cancellations += 1,
                        _ => {}
                    }
                }
                TelemetryEvent::Abandoned { timed_out, .. } => {
                    stats.abandoned += 1;
                    if *timed_out {
                        stats.timeouts += 1;
                    }
                }
                TelemetryEvent::ProtocolViolation { .. } => {
                    stats.protocol_violations += 1;
                }
            }
        }

        lock(&self.events).push(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = lock(&self.events);
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Fraction of finished sessions that ended in success
    pub fn success_rate(&self) -> f64 {
        let stats = lock(&self.stats);
        let total = stats.successes + stats.failures;
        if total == 0 {
            0.0
        } else {
            stats.successes as f64 / total as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}
