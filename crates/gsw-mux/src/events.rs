//! Controller events
//!
//! The controller buffers one event per observable step of a transition.
//! Callers drain them after each call for logging or display.

use std::time::Duration;

use crate::state::{Gpu, SwitchMode, TransitionStep};

/// Something that happened during a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchEvent {
    /// A transition began
    TransitionStarted { mode: SwitchMode },
    /// A step succeeded
    StepCompleted { step: TransitionStep },
    /// A step failed
    StepFailed {
        step: TransitionStep,
        raw_code: Option<i32>,
    },
    /// The settle delay elapsed
    Settled { delay: Duration },
    /// The active card was read
    CardObserved { card: Gpu },
    /// The target card was already active; no switch issued
    AlreadyActive { card: Gpu },
    /// The transition ran to completion
    TransitionCompleted {
        mode: SwitchMode,
        force_switched: bool,
    },
    /// The transition stopped at a failed step
    TransitionAborted {
        mode: SwitchMode,
        failed_step: TransitionStep,
    },
}

impl SwitchEvent {
    /// Returns true for failure events
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::StepFailed { .. } | Self::TransitionAborted { .. }
        )
    }
}
