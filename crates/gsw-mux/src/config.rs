//! Controller configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::state::Gpu;

/// Default settle delay between the policy writes and the active-card read
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// Switch-mode controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Wait before reading the active card in force modes (ms)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// GPU that a nonzero active-card readback stands for
    ///
    /// The readback is driver-defined; zero means the other GPU.
    #[serde(default = "default_nonzero_active_card")]
    pub nonzero_active_card: Gpu,
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

fn default_nonzero_active_card() -> Gpu {
    Gpu::Discrete
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            nonzero_active_card: Gpu::Discrete,
        }
    }
}

impl ControllerConfig {
    /// Configuration with no settle delay
    pub fn without_settle() -> Self {
        Self {
            settle_delay_ms: 0,
            ..Default::default()
        }
    }

    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Interpret a raw active-card readback
    pub fn decode_active_card(&self, raw: u64) -> Gpu {
        if raw != 0 {
            self.nonzero_active_card
        } else {
            self.nonzero_active_card.other()
        }
    }
}
