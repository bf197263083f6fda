//! Mux state request encoding
//!
//! Both get and set requests lead with the mux control selector, which the
//! driver always expects to be 1.

use crate::error::ProtocolError;
use crate::key::MuxStateKey;
use crate::selector::OperationCode;

/// Leading scalar of every mux state request
pub const MUX_CONTROL: u64 = 1;

/// A single get or set mux state request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MuxRequest {
    /// Read a key: `[1, key]` with one output scalar
    Get { key: MuxStateKey },
    /// Write a key: `[1, key, arg]` with no output scalars
    Set { key: MuxStateKey, arg: u64 },
}

impl MuxRequest {
    /// Build a get request
    pub fn get(key: MuxStateKey) -> Self {
        Self::Get { key }
    }

    /// Build a set request
    pub fn set(key: MuxStateKey, arg: u64) -> Self {
        Self::Set { key, arg }
    }

    /// The key this request addresses
    pub fn key(&self) -> MuxStateKey {
        match self {
            Self::Get { key } | Self::Set { key, .. } => *key,
        }
    }

    /// Driver operation carrying this request
    pub fn operation(&self) -> OperationCode {
        match self {
            Self::Get { .. } => OperationCode::GetMuxState,
            Self::Set { .. } => OperationCode::SetMuxState,
        }
    }

    /// Number of scalar outputs the driver answers with
    pub fn output_count(&self) -> usize {
        match self {
            Self::Get { .. } => 1,
            Self::Set { .. } => 0,
        }
    }

    /// Check the key is used in a direction it supports
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let op = self.operation();
        let key = self.key();
        if key.supports(op) {
            Ok(())
        } else {
            Err(ProtocolError::WrongDirection { key, op })
        }
    }

    /// Encode to the driver's scalar inputs
    pub fn encode(&self) -> Vec<u64> {
        match self {
            Self::Get { key } => vec![MUX_CONTROL, key.code()],
            Self::Set { key, arg } => vec![MUX_CONTROL, key.code(), *arg],
        }
    }

    /// Decode the scalar inputs of a driver call
    ///
    /// Returns `None` if `op` is not a mux state operation or the scalars do
    /// not form a request.
    pub fn decode(op: OperationCode, inputs: &[u64]) -> Option<Self> {
        match (op, inputs) {
            (OperationCode::GetMuxState, [MUX_CONTROL, code]) => {
                MuxStateKey::from_code(op, *code).map(Self::get)
            }
            (OperationCode::SetMuxState, [MUX_CONTROL, code, arg]) => {
                MuxStateKey::from_code(op, *code).map(|key| Self::set(key, *arg))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_encoding() {
        let req = MuxRequest::get(MuxStateKey::ActiveCard);
        assert_eq!(req.encode(), vec![1, 7]);
        assert_eq!(req.operation(), OperationCode::GetMuxState);
        assert_eq!(req.output_count(), 1);
    }

    #[test]
    fn test_set_encoding() {
        let req = MuxRequest::set(MuxStateKey::EnableFeature, 1 << 16);
        assert_eq!(req.encode(), vec![1, 1, 0x10000]);
        assert_eq!(req.operation(), OperationCode::SetMuxState);
        assert_eq!(req.output_count(), 0);
    }

    #[test]
    fn test_full_width_arg_preserved() {
        let req = MuxRequest::set(MuxStateKey::Debug, u64::MAX);
        let decoded = MuxRequest::decode(OperationCode::SetMuxState, &req.encode());
        assert_eq!(decoded, Some(MuxRequest::set(MuxStateKey::Debug, u64::MAX)));
    }

    #[test]
    fn test_decode_rejects_bad_leading_scalar() {
        assert_eq!(MuxRequest::decode(OperationCode::GetMuxState, &[0, 7]), None);
        assert_eq!(MuxRequest::decode(OperationCode::GetMuxState, &[1]), None);
        assert_eq!(MuxRequest::decode(OperationCode::DumpState, &[1, 7]), None);
    }

    #[test]
    fn test_validate_direction() {
        assert!(MuxRequest::get(MuxStateKey::FeatureInfo).validate().is_ok());
        assert_eq!(
            MuxRequest::get(MuxStateKey::ForceSwitch).validate(),
            Err(ProtocolError::WrongDirection {
                key: MuxStateKey::ForceSwitch,
                op: OperationCode::GetMuxState,
            })
        );
        assert!(MuxRequest::set(MuxStateKey::ActiveCard, 0).validate().is_err());
    }
}
