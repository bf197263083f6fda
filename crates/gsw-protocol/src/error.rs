//! Error types for mux protocol calls

use thiserror::Error;

use crate::key::MuxStateKey;
use crate::selector::OperationCode;

/// A driver call that did not return success
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("driver returned 0x{raw_code:08x}")]
pub struct ChannelError {
    /// Raw driver return code
    pub raw_code: i32,
}

impl ChannelError {
    /// Wrap a raw driver return code
    pub fn new(raw_code: i32) -> Self {
        Self { raw_code }
    }
}

/// Errors that can occur while talking to the driver
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The driver call itself failed
    #[error("{op} failed: driver returned 0x{raw_code:08x}")]
    Channel { op: OperationCode, raw_code: i32 },

    /// No open channel for this handle
    #[error("channel handle is not open")]
    InvalidHandle,

    /// Reserved or unknown switch policy value
    #[error("unsupported switch policy value: {0}")]
    UnsupportedPolicyValue(u64),

    /// Key used in a direction it does not support
    #[error("{key} cannot be used with {op}")]
    WrongDirection { key: MuxStateKey, op: OperationCode },

    /// Driver returned an unexpected number of scalar outputs
    #[error("expected {expected} output scalars, driver returned {actual}")]
    OutputCount { expected: usize, actual: usize },
}

impl ProtocolError {
    /// Raw driver return code, if the driver was actually reached
    pub fn raw_code(&self) -> Option<i32> {
        match self {
            Self::Channel { raw_code, .. } => Some(*raw_code),
            _ => None,
        }
    }
}
