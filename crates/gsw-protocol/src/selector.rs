//! Driver method selectors
//!
//! The numbering is fixed by the driver's dispatch table and must never change.

use std::fmt;

/// A function exposed by the graphics control driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationCode {
    /// Open the user client session
    Open,
    /// Close the user client session
    Close,
    /// Write a mux state key
    SetMuxState,
    /// Read a mux state key
    GetMuxState,
    /// Claim exclusive access
    SetExclusive,
    /// Dump the 100-byte driver state struct
    DumpState,
    /// Upload display EDID data
    UploadEdid,
    /// Read logging metadata
    GetAgcData,
    /// Read the primary log buffer
    GetAgcDataLog1,
    /// Read the secondary log buffer (mux registers)
    GetAgcDataLog2,
}

impl OperationCode {
    /// Every selector in dispatch-table order
    pub const ALL: [OperationCode; 10] = [
        Self::Open,
        Self::Close,
        Self::SetMuxState,
        Self::GetMuxState,
        Self::SetExclusive,
        Self::DumpState,
        Self::UploadEdid,
        Self::GetAgcData,
        Self::GetAgcDataLog1,
        Self::GetAgcDataLog2,
    ];

    /// Selector number passed to the driver
    pub fn selector(&self) -> u32 {
        match self {
            Self::Open => 0,
            Self::Close => 1,
            Self::SetMuxState => 2,
            Self::GetMuxState => 3,
            Self::SetExclusive => 4,
            Self::DumpState => 5,
            Self::UploadEdid => 6,
            Self::GetAgcData => 7,
            Self::GetAgcDataLog1 => 8,
            Self::GetAgcDataLog2 => 9,
        }
    }

    /// Look up a selector number
    pub fn from_selector(selector: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.selector() == selector)
    }

    /// Returns a human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::SetMuxState => "set-mux-state",
            Self::GetMuxState => "get-mux-state",
            Self::SetExclusive => "set-exclusive",
            Self::DumpState => "dump-state",
            Self::UploadEdid => "upload-edid",
            Self::GetAgcData => "read-log-metadata",
            Self::GetAgcDataLog1 => "read-log-primary",
            Self::GetAgcDataLog2 => "read-log-secondary",
        }
    }
}

impl fmt::Display for OperationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_are_dense_and_ordered() {
        for (i, op) in OperationCode::ALL.iter().enumerate() {
            assert_eq!(op.selector(), i as u32);
        }
    }

    #[test]
    fn test_from_selector() {
        assert_eq!(
            OperationCode::from_selector(3),
            Some(OperationCode::GetMuxState)
        );
        assert_eq!(
            OperationCode::from_selector(2),
            Some(OperationCode::SetMuxState)
        );
        assert_eq!(OperationCode::from_selector(10), None);
    }
}
