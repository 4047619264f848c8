//! afconverge - AF/AE convergence for capture pipelines
//!
//! Drives the autofocus-then-exposure convergence sequence of a camera
//! session: after the focus-lock request goes out, every capture result is
//! fed to a small state machine that decides when focus and exposure have
//! settled, stalled, or been cancelled, and reports one terminal outcome.
//!
//! # Architecture
//!
//! - [`convergence`]: the synchronous state machine, cancel flag, and a
//!   lock-guarded variant for callback delivery
//! - [`session`]: async driver owning the observation source and timeout
//! - [`regions`]: focus-point to metering-rectangle geometry
//! - [`telemetry`], [`config`], [`trace`]: supporting plumbing

pub mod errors;
pub mod types;
pub mod convergence;
pub mod regions;
pub mod session;
pub mod telemetry;

// Re-export commonly used types
pub use errors::{ConvergeError, Result};
pub use types::{AeState, AfState, Observation, Outcome, TerminalReason, TerminalReport, TransitionResult};
pub use convergence::{CancelFlag, ConvergenceMachine, ConvergenceState, MachineConfig};

// Configuration, CLI and replay support
pub mod config;
pub mod cli;
pub mod logging;
pub mod trace;
