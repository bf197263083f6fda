//! Error types for the switch-mode controller

use gsw_protocol::ProtocolError;
use thiserror::Error;

use crate::state::{SwitchMode, TransitionStep};

/// Errors that can occur while querying or switching the mux
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwitchError {
    /// A query failed
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A mode transition stopped partway
    ///
    /// Every step is idempotent, so the whole transition may be retried.
    #[error("{mode} stopped at step {failed_step}: {source}")]
    PartialTransition {
        /// Mode being applied
        mode: SwitchMode,
        /// Steps that succeeded before the transition stopped
        completed_steps: Vec<TransitionStep>,
        /// First step that failed
        failed_step: TransitionStep,
        /// Why it failed
        #[source]
        source: ProtocolError,
    },
}

impl SwitchError {
    /// Raw driver return code, if the driver was reached
    pub fn raw_code(&self) -> Option<i32> {
        match self {
            Self::Protocol(e) => e.raw_code(),
            Self::PartialTransition { source, .. } => source.raw_code(),
        }
    }

    /// Step that failed, for transition errors
    pub fn failed_step(&self) -> Option<TransitionStep> {
        match self {
            Self::Protocol(_) => None,
            Self::PartialTransition { failed_step, .. } => Some(*failed_step),
        }
    }
}

/// Unrecognised switch mode name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown switch mode: {0} (expected integrated, discrete, dynamic or toggle)")]
pub struct ParseModeError(pub String);
