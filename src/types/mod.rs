//! Type definitions module
//!
//! Sensor observations and the outcomes a convergence session can end with.

pub mod sensor;
pub mod outcome;

// Re-export commonly used types
pub use sensor::{AeState, AfState, Observation};
pub use outcome::{Outcome, TerminalReason, TerminalReport, TransitionResult};
