//! Mux state keys and switch policy values
//!
//! Get and set calls use separate key namespaces: `DisableFeature` and
//! `FeatureInfo` are both code 0, `EnableFeature` and `FeatureInfo2` are both
//! code 1. Lookups are therefore always scoped to a direction.

use std::fmt;

use crate::selector::OperationCode;

/// Which calls a key may be used with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyAccess {
    /// Only valid with set-mux-state
    SetOnly,
    /// Only valid with get-mux-state
    GetOnly,
    /// Valid in both directions
    ReadWrite,
}

impl KeyAccess {
    /// Whether a get-mux-state call may address this key
    pub fn readable(&self) -> bool {
        matches!(self, Self::GetOnly | Self::ReadWrite)
    }

    /// Whether a set-mux-state call may address this key
    pub fn writable(&self) -> bool {
        matches!(self, Self::SetOnly | Self::ReadWrite)
    }
}

/// A property of the switching hardware addressed by get/set mux state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MuxStateKey {
    /// Clear the feature bits given in the argument
    DisableFeature,
    /// Set the feature bits given in the argument
    EnableFeature,
    /// The 64-bit feature mask
    FeatureInfo,
    /// Alias of `FeatureInfo`
    FeatureInfo2,
    /// Switch GPUs now regardless of the switching mode
    ForceSwitch,
    /// GPU power state (0x8 integrated only, 0x88 both powered)
    PowerGpu,
    /// Dynamic switching on (1) or off (0)
    GpuSelect,
    /// Switch policy, see [`SwitchPolicy`]
    SwitchPolicy,
    /// Currently active graphics card
    ActiveCard,
    /// Driver debug value
    Debug,
}

impl MuxStateKey {
    /// Every key
    pub const ALL: [MuxStateKey; 10] = [
        Self::DisableFeature,
        Self::EnableFeature,
        Self::FeatureInfo,
        Self::FeatureInfo2,
        Self::ForceSwitch,
        Self::PowerGpu,
        Self::GpuSelect,
        Self::SwitchPolicy,
        Self::ActiveCard,
        Self::Debug,
    ];

    /// The scalar sent as the key argument
    pub fn code(&self) -> u64 {
        match self {
            Self::DisableFeature | Self::FeatureInfo => 0,
            Self::EnableFeature | Self::FeatureInfo2 => 1,
            Self::ForceSwitch => 2,
            Self::PowerGpu => 3,
            Self::GpuSelect => 4,
            Self::SwitchPolicy => 5,
            Self::ActiveCard => 7,
            Self::Debug => 8,
        }
    }

    /// Directions this key supports
    pub fn access(&self) -> KeyAccess {
        match self {
            Self::DisableFeature | Self::EnableFeature | Self::ForceSwitch => KeyAccess::SetOnly,
            Self::FeatureInfo | Self::FeatureInfo2 | Self::ActiveCard => KeyAccess::GetOnly,
            Self::PowerGpu | Self::GpuSelect | Self::SwitchPolicy | Self::Debug => {
                KeyAccess::ReadWrite
            }
        }
    }

    /// Whether this key may be used with `op`
    pub fn supports(&self, op: OperationCode) -> bool {
        match op {
            OperationCode::GetMuxState => self.access().readable(),
            OperationCode::SetMuxState => self.access().writable(),
            _ => false,
        }
    }

    /// Decode a key code in the namespace of `op`
    pub fn from_code(op: OperationCode, code: u64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.code() == code && key.supports(op))
    }

    /// Returns a human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::DisableFeature => "disable-feature",
            Self::EnableFeature => "enable-feature",
            Self::FeatureInfo => "feature-info",
            Self::FeatureInfo2 => "feature-info-2",
            Self::ForceSwitch => "force-switch",
            Self::PowerGpu => "power-gpu",
            Self::GpuSelect => "gpu-select",
            Self::SwitchPolicy => "switch-policy",
            Self::ActiveCard => "active-card",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for MuxStateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values accepted by [`MuxStateKey::SwitchPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SwitchPolicy {
    /// Dynamic switching, switches take effect without logging out
    Dynamic,
    /// No dynamic switching, like older machines with a mux
    Legacy,
    /// No dynamic switching and stuck on the current card
    ///
    /// Reserved: decodes, but is never written.
    Stuck,
}

impl SwitchPolicy {
    /// Raw value on the wire
    pub fn value(&self) -> u64 {
        match self {
            Self::Dynamic => 0,
            Self::Legacy => 2,
            Self::Stuck => 3,
        }
    }

    /// Decode a raw policy value
    pub fn from_value(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Dynamic),
            2 => Some(Self::Legacy),
            3 => Some(Self::Stuck),
            _ => None,
        }
    }

    /// Whether this value may be written to the driver
    pub fn is_settable(&self) -> bool {
        !matches!(self, Self::Stuck)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_codes_unique_per_direction() {
        for op in [OperationCode::GetMuxState, OperationCode::SetMuxState] {
            let mut seen = HashSet::new();
            for key in MuxStateKey::ALL.iter().filter(|k| k.supports(op)) {
                assert!(seen.insert(key.code()), "{key} collides for {op}");
            }
        }
    }

    #[test]
    fn test_from_code_is_direction_scoped() {
        assert_eq!(
            MuxStateKey::from_code(OperationCode::GetMuxState, 0),
            Some(MuxStateKey::FeatureInfo)
        );
        assert_eq!(
            MuxStateKey::from_code(OperationCode::SetMuxState, 0),
            Some(MuxStateKey::DisableFeature)
        );
        assert_eq!(
            MuxStateKey::from_code(OperationCode::SetMuxState, 1),
            Some(MuxStateKey::EnableFeature)
        );
        assert_eq!(MuxStateKey::from_code(OperationCode::SetMuxState, 7), None);
        assert_eq!(MuxStateKey::from_code(OperationCode::GetMuxState, 6), None);
    }

    #[test]
    fn test_every_key_decodes_back() {
        for key in MuxStateKey::ALL {
            for op in [OperationCode::GetMuxState, OperationCode::SetMuxState] {
                if key.supports(op) {
                    assert_eq!(MuxStateKey::from_code(op, key.code()), Some(key));
                }
            }
        }
    }

    #[test]
    fn test_switch_policy_values() {
        assert_eq!(SwitchPolicy::Dynamic.value(), 0);
        assert_eq!(SwitchPolicy::Legacy.value(), 2);
        assert_eq!(SwitchPolicy::from_value(3), Some(SwitchPolicy::Stuck));
        assert_eq!(SwitchPolicy::from_value(1), None);
        assert!(!SwitchPolicy::Stuck.is_settable());
        assert!(SwitchPolicy::Legacy.is_settable());
    }
}
