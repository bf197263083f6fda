//! Driver feature bits
//!
//! The feature mask read through [`MuxStateKey::FeatureInfo`] has one bit per
//! named driver behavior. Bits 6..=7 and 11..=15 are unused; bit 16 turns on
//! driver logging.
//!
//! `GpuPowerPolling` is inverted: a set bit means polling is off. The
//! [`FeatureRegistry`] getters and setters work in logical terms and hide this.

use std::fmt;

use tracing::debug;

use crate::error::ProtocolError;
use crate::key::MuxStateKey;
use crate::protocol::MuxProtocol;
use crate::{ChannelHandle, MuxChannel};

/// A named bit in the driver feature mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureBit {
    /// Switching policy; when on, the GPU returns to discrete after a demanding app exits
    Policy,
    /// Power down the discrete GPU when idle
    AutoPowerDownGpu,
    /// Dynamic switching
    DynamicSwitching,
    /// GPU power polling (inverted bit)
    GpuPowerPolling,
    /// Defer policy changes
    DeferPolicy,
    /// Synchronous launch
    SynchronousLaunch,
    /// Backlight control
    BacklightControl,
    /// Recovery timeouts
    RecoveryTimeouts,
    /// Power switch debounce
    PowerSwitchDebounce,
    /// Driver logging
    Logging,
    /// Display capture switch
    DisplayCaptureSwitch,
    /// No GL HDA busy/idle registration
    NoGlHdaBusyIdleRegistration,
}

impl FeatureBit {
    /// Every feature bit in mask order
    pub const ALL: [FeatureBit; 12] = [
        Self::Policy,
        Self::AutoPowerDownGpu,
        Self::DynamicSwitching,
        Self::GpuPowerPolling,
        Self::DeferPolicy,
        Self::SynchronousLaunch,
        Self::BacklightControl,
        Self::RecoveryTimeouts,
        Self::PowerSwitchDebounce,
        Self::Logging,
        Self::DisplayCaptureSwitch,
        Self::NoGlHdaBusyIdleRegistration,
    ];

    /// Bit position in the feature mask
    pub fn position(&self) -> u32 {
        match self {
            Self::Policy => 0,
            Self::AutoPowerDownGpu => 1,
            Self::DynamicSwitching => 2,
            Self::GpuPowerPolling => 3,
            Self::DeferPolicy => 4,
            Self::SynchronousLaunch => 5,
            Self::BacklightControl => 8,
            Self::RecoveryTimeouts => 9,
            Self::PowerSwitchDebounce => 10,
            Self::Logging => 16,
            Self::DisplayCaptureSwitch => 17,
            Self::NoGlHdaBusyIdleRegistration => 18,
        }
    }

    /// Single-bit mask for this feature
    pub fn mask(&self) -> u64 {
        1u64 << self.position()
    }

    /// Look up the feature at a bit position
    pub fn from_position(position: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|bit| bit.position() == position)
    }

    /// Whether a set bit means the behavior is off
    pub fn is_inverted(&self) -> bool {
        matches!(self, Self::GpuPowerPolling)
    }

    /// Driver label for this feature
    pub fn label(&self) -> &'static str {
        match self {
            Self::Policy => "Policy",
            Self::AutoPowerDownGpu => "Auto_PowerDown_GPU",
            Self::DynamicSwitching => "Dynamic_Switching",
            Self::GpuPowerPolling => "GPU_Powerpolling",
            Self::DeferPolicy => "Defer_Policy",
            Self::SynchronousLaunch => "Synchronous_Launch",
            Self::BacklightControl => "Backlight_Control",
            Self::RecoveryTimeouts => "Recovery_Timeouts",
            Self::PowerSwitchDebounce => "Power_Switch_Debounce",
            Self::Logging => "Logging",
            Self::DisplayCaptureSwitch => "Display_Capture_Switch",
            Self::NoGlHdaBusyIdleRegistration => "No_GL_HDA_busy_idle_registration",
        }
    }
}

impl fmt::Display for FeatureBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw bit test: `(mask >> bit) & 1 == 1`
pub fn is_set(mask: u64, bit: FeatureBit) -> bool {
    (mask >> bit.position()) & 1 == 1
}

/// The 64-bit feature mask as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureMask(pub u64);

impl FeatureMask {
    /// Raw mask value
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Whether the raw bit for `bit` is set
    pub fn is_set(&self, bit: FeatureBit) -> bool {
        is_set(self.0, bit)
    }

    /// Whether the behavior behind `bit` is on, accounting for inverted bits
    pub fn is_enabled(&self, bit: FeatureBit) -> bool {
        self.is_set(bit) != bit.is_inverted()
    }

    /// Logical state of every known feature
    pub fn entries(&self) -> impl Iterator<Item = (FeatureBit, bool)> + '_ {
        FeatureBit::ALL
            .into_iter()
            .map(move |bit| (bit, self.is_enabled(bit)))
    }

    /// Set bits that do not belong to any known feature
    pub fn unknown_bits(&self) -> u64 {
        let known = FeatureBit::ALL.iter().fold(0u64, |acc, bit| acc | bit.mask());
        self.0 & !known
    }
}

impl fmt::Display for FeatureMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (bit, enabled) in self.entries() {
            writeln!(f, "{}: {}", bit.label(), if enabled { "ON" } else { "OFF" })?;
        }
        Ok(())
    }
}

/// Feature-bit operations over a [`MuxProtocol`]
pub struct FeatureRegistry<'p, C> {
    protocol: &'p mut MuxProtocol<C>,
}

impl<'p, C: MuxChannel> FeatureRegistry<'p, C> {
    /// Borrow a protocol for feature operations
    pub fn new(protocol: &'p mut MuxProtocol<C>) -> Self {
        Self { protocol }
    }

    /// Read the full feature mask
    pub fn mask(&mut self, handle: ChannelHandle) -> Result<FeatureMask, ProtocolError> {
        self.protocol
            .get_state(handle, MuxStateKey::FeatureInfo)
            .map(FeatureMask)
    }

    /// Whether the behavior behind `bit` is on
    pub fn get(&mut self, handle: ChannelHandle, bit: FeatureBit) -> Result<bool, ProtocolError> {
        Ok(self.mask(handle)?.is_enabled(bit))
    }

    /// Turn the behavior behind `bit` on or off
    ///
    /// The key selects enable vs disable and the argument selects the bit.
    /// For inverted bits the key is flipped so the behavior follows `enabled`.
    pub fn set(
        &mut self,
        handle: ChannelHandle,
        bit: FeatureBit,
        enabled: bool,
    ) -> Result<(), ProtocolError> {
        let raw_on = enabled != bit.is_inverted();
        let key = if raw_on {
            MuxStateKey::EnableFeature
        } else {
            MuxStateKey::DisableFeature
        };
        debug!("feature {} -> {}", bit, if enabled { "ON" } else { "OFF" });
        self.protocol.set_state(handle, key, bit.mask())
    }

    /// Turn on driver logging
    pub fn enable_logging(&mut self, handle: ChannelHandle) -> Result<(), ProtocolError> {
        self.set(handle, FeatureBit::Logging, true)
    }
}
