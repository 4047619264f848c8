//! Sensor-state vocabulary carried by capture results
//!
//! Platform capture APIs report AF and AE state as small integer codes.
//! Known codes map to named variants; anything else is kept verbatim in
//! `Unknown` so two unrecognized reports can still be compared for identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Autofocus state reported with a capture result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfState {
    Inactive,
    PassiveScan,
    PassiveFocused,
    ActiveScan,
    /// Focus motor settled with the subject in focus
    FocusedLocked,
    /// Focus motor settled without achieving focus
    NotFocusedLocked,
    PassiveUnfocused,
    Unknown(i32),
}

impl AfState {
    /// Map a platform AF state code
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => AfState::Inactive,
            1 => AfState::PassiveScan,
            2 => AfState::PassiveFocused,
            3 => AfState::ActiveScan,
            4 => AfState::FocusedLocked,
            5 => AfState::NotFocusedLocked,
            6 => AfState::PassiveUnfocused,
            other => AfState::Unknown(other),
        }
    }

    /// Platform code for this state
    pub fn raw(&self) -> i32 {
        match self {
            AfState::Inactive => 0,
            AfState::PassiveScan => 1,
            AfState::PassiveFocused => 2,
            AfState::ActiveScan => 3,
            AfState::FocusedLocked => 4,
            AfState::NotFocusedLocked => 5,
            AfState::PassiveUnfocused => 6,
            AfState::Unknown(code) => *code,
        }
    }

    /// Focus motor has stopped, matched or not
    pub fn is_locked(&self) -> bool {
        matches!(self, AfState::FocusedLocked | AfState::NotFocusedLocked)
    }
}

impl fmt::Display for AfState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AfState::Inactive => write!(f, "INACTIVE"),
            AfState::PassiveScan => write!(f, "PASSIVE_SCAN"),
            AfState::PassiveFocused => write!(f, "PASSIVE_FOCUSED"),
            AfState::ActiveScan => write!(f, "ACTIVE_SCAN"),
            AfState::FocusedLocked => write!(f, "FOCUSED_LOCKED"),
            AfState::NotFocusedLocked => write!(f, "NOT_FOCUSED_LOCKED"),
            AfState::PassiveUnfocused => write!(f, "PASSIVE_UNFOCUSED"),
            AfState::Unknown(code) => write!(f, "UNKNOWN({})", code),
        }
    }
}

/// Auto-exposure state reported with a capture result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AeState {
    Inactive,
    Searching,
    Converged,
    Locked,
    FlashRequired,
    /// Pre-capture metering sequence in progress
    Precapture,
    Unknown(i32),
}

impl AeState {
    /// Map a platform AE state code
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => AeState::Inactive,
            1 => AeState::Searching,
            2 => AeState::Converged,
            3 => AeState::Locked,
            4 => AeState::FlashRequired,
            5 => AeState::Precapture,
            other => AeState::Unknown(other),
        }
    }

    /// Platform code for this state
    pub fn raw(&self) -> i32 {
        match self {
            AeState::Inactive => 0,
            AeState::Searching => 1,
            AeState::Converged => 2,
            AeState::Locked => 3,
            AeState::FlashRequired => 4,
            AeState::Precapture => 5,
            AeState::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for AeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AeState::Inactive => write!(f, "INACTIVE"),
            AeState::Searching => write!(f, "SEARCHING"),
            AeState::Converged => write!(f, "CONVERGED"),
            AeState::Locked => write!(f, "LOCKED"),
            AeState::FlashRequired => write!(f, "FLASH_REQUIRED"),
            AeState::Precapture => write!(f, "PRECAPTURE"),
            AeState::Unknown(code) => write!(f, "UNKNOWN({})", code),
        }
    }
}

/// Snapshot of the two signals relevant to convergence, one per capture result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub af_state: Option<AfState>,
    #[serde(default)]
    pub ae_state: Option<AeState>,
}

impl Observation {
    pub fn new(af_state: Option<AfState>, ae_state: Option<AeState>) -> Self {
        Self { af_state, ae_state }
    }

    /// Build from raw platform codes as read off a capture result
    pub fn from_raw(af_code: Option<i32>, ae_code: Option<i32>) -> Self {
        Self {
            af_state: af_code.map(AfState::from_raw),
            ae_state: ae_code.map(AeState::from_raw),
        }
    }

    /// Observation carrying only an AF state
    pub fn af(af_state: AfState) -> Self {
        Self::new(Some(af_state), None)
    }

    /// Observation carrying only an AE state
    pub fn ae(ae_state: AeState) -> Self {
        Self::new(None, Some(ae_state))
    }

    /// Observation carrying both states
    pub fn both(af_state: AfState, ae_state: AeState) -> Self {
        Self::new(Some(af_state), Some(ae_state))
    }
}
