//! Switch modes, GPUs and transition steps

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseModeError;

/// One of the two graphics processors behind the mux
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gpu {
    /// Integrated (low power) GPU
    Integrated,
    /// Discrete (high performance) GPU
    Discrete,
}

impl Gpu {
    /// The other GPU
    pub fn other(&self) -> Gpu {
        match self {
            Self::Integrated => Self::Discrete,
            Self::Discrete => Self::Integrated,
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Integrated => "integrated",
            Self::Discrete => "discrete",
        }
    }
}

impl fmt::Display for Gpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the caller wants the mux to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchMode {
    /// Pin the display to the integrated GPU
    ForceIntegrated,
    /// Pin the display to the discrete GPU
    ForceDiscrete,
    /// Hand switching back to the driver
    DynamicSwitching,
    /// Swap GPUs now, without checking the current one
    ToggleNow,
}

impl SwitchMode {
    /// Every mode
    pub const ALL: [SwitchMode; 4] = [
        Self::ForceIntegrated,
        Self::ForceDiscrete,
        Self::DynamicSwitching,
        Self::ToggleNow,
    ];

    /// GPU a force mode pins the display to
    pub fn target(&self) -> Option<Gpu> {
        match self {
            Self::ForceIntegrated => Some(Gpu::Integrated),
            Self::ForceDiscrete => Some(Gpu::Discrete),
            Self::DynamicSwitching | Self::ToggleNow => None,
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::ForceIntegrated => "Force Integrated",
            Self::ForceDiscrete => "Force Discrete",
            Self::DynamicSwitching => "Dynamic Switching",
            Self::ToggleNow => "Toggle Now",
        }
    }

    /// Command name used to select this mode
    pub fn command(&self) -> &'static str {
        match self {
            Self::ForceIntegrated => "integrated",
            Self::ForceDiscrete => "discrete",
            Self::DynamicSwitching => "dynamic",
            Self::ToggleNow => "toggle",
        }
    }

    /// Get description
    pub fn description(&self) -> &'static str {
        match self {
            Self::ForceIntegrated => "Disable dynamic switching and stay on the integrated GPU",
            Self::ForceDiscrete => "Disable dynamic switching and stay on the discrete GPU",
            Self::DynamicSwitching => "Let the driver switch GPUs on demand",
            Self::ToggleNow => "Switch to the other GPU immediately",
        }
    }
}

impl fmt::Display for SwitchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SwitchMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.command() == lower)
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}

/// One step of a mode transition
///
/// Numbers follow the order the steps run in within their mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionStep {
    /// Force modes: turn dynamic switching off
    DisableDynamicSwitching,
    /// Force modes: clear the Policy feature so the driver does not switch back
    DisablePolicyFeature,
    /// Force modes: legacy (non-dynamic) switch policy
    SetLegacyPolicy,
    /// Force modes: wait for the active-card readback to catch up
    Settle,
    /// Force modes: read the active card
    ReadActiveCard,
    /// Force modes: switch because the active card is not the target
    ForceSwitch,
    /// Dynamic mode: set the Policy feature again
    EnablePolicyFeature,
    /// Dynamic mode: dynamic switch policy
    SetDynamicPolicy,
    /// Dynamic mode: turn dynamic switching on
    EnableDynamicSwitching,
    /// Toggle mode: unconditional force-switch
    Toggle,
}

impl TransitionStep {
    /// 1-based position within its mode
    pub fn number(&self) -> u8 {
        match self {
            Self::DisableDynamicSwitching => 1,
            Self::DisablePolicyFeature => 2,
            Self::SetLegacyPolicy => 3,
            Self::Settle => 4,
            Self::ReadActiveCard => 5,
            Self::ForceSwitch => 7,
            Self::EnablePolicyFeature => 1,
            Self::SetDynamicPolicy => 2,
            Self::EnableDynamicSwitching => 3,
            Self::Toggle => 1,
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::DisableDynamicSwitching => "disable dynamic switching",
            Self::DisablePolicyFeature => "disable policy feature",
            Self::SetLegacyPolicy => "set legacy switch policy",
            Self::Settle => "settle",
            Self::ReadActiveCard => "read active card",
            Self::ForceSwitch => "force switch",
            Self::EnablePolicyFeature => "enable policy feature",
            Self::SetDynamicPolicy => "set dynamic switch policy",
            Self::EnableDynamicSwitching => "enable dynamic switching",
            Self::Toggle => "toggle",
        }
    }
}

impl fmt::Display for TransitionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_targets() {
        assert_eq!(SwitchMode::ForceIntegrated.target(), Some(Gpu::Integrated));
        assert_eq!(SwitchMode::ForceDiscrete.target(), Some(Gpu::Discrete));
        assert_eq!(SwitchMode::DynamicSwitching.target(), None);
        assert_eq!(SwitchMode::ToggleNow.target(), None);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(
            "integrated".parse::<SwitchMode>().unwrap(),
            SwitchMode::ForceIntegrated
        );
        assert_eq!(
            " Discrete ".parse::<SwitchMode>().unwrap(),
            SwitchMode::ForceDiscrete
        );
        assert_eq!(
            "dynamic".parse::<SwitchMode>().unwrap(),
            SwitchMode::DynamicSwitching
        );
        assert_eq!("toggle".parse::<SwitchMode>().unwrap(), SwitchMode::ToggleNow);
        assert_eq!(
            "auto".parse::<SwitchMode>(),
            Err(ParseModeError("auto".to_string()))
        );
    }

    #[test]
    fn test_step_display() {
        assert_eq!(
            TransitionStep::DisableDynamicSwitching.to_string(),
            "1 (disable dynamic switching)"
        );
        assert_eq!(TransitionStep::ForceSwitch.number(), 7);
    }

    #[test]
    fn test_gpu_other() {
        assert_eq!(Gpu::Integrated.other(), Gpu::Discrete);
        assert_eq!(Gpu::Discrete.other().other(), Gpu::Discrete);
    }
}
