//! AF/AE convergence state machine
//! Maps a stream of capture-result observations to a single terminal outcome

pub mod cancel;
pub mod machine;
pub mod shared;
pub mod state;

pub use cancel::CancelFlag;
pub use machine::{ConvergenceMachine, MachineConfig, DEFAULT_STALL_THRESHOLD};
pub use shared::SharedMachine;
pub use state::ConvergenceState;
