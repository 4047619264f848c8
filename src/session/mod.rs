//! Collaborator-side session plumbing
//!
//! Owns the subscription lifetime around the convergence machine: feeds it,
//! enforces the wall-clock timeout, and detaches the source exactly once.

pub mod driver;
pub mod source;

pub use driver::{AutoFocusDriver, SessionConfig, SessionReport};
pub use source::{ChannelSource, ObservationSource, Subscription, TraceSource};
