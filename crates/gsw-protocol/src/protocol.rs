//! Get/set mux state round-trips

use tracing::{debug, warn};

use crate::error::ProtocolError;
use crate::feature::FeatureRegistry;
use crate::key::{MuxStateKey, SwitchPolicy};
use crate::request::MuxRequest;
use crate::{ChannelHandle, MuxChannel};

/// Translates get/set requests into driver calls over a [`MuxChannel`]
///
/// Holds no protocol state of its own; every call is a single round-trip.
#[derive(Debug)]
pub struct MuxProtocol<C> {
    channel: C,
}

impl<C: MuxChannel> MuxProtocol<C> {
    /// Wrap a channel
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    /// Access the underlying channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Mutable access to the underlying channel
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Unwrap the underlying channel
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Feature-bit view over this protocol
    pub fn features(&mut self) -> FeatureRegistry<'_, C> {
        FeatureRegistry::new(self)
    }

    /// Read a mux state key
    pub fn get_state(
        &mut self,
        handle: ChannelHandle,
        key: MuxStateKey,
    ) -> Result<u64, ProtocolError> {
        let outputs = self.execute(handle, MuxRequest::get(key))?;
        match outputs.as_slice() {
            [value] => {
                debug!("get {} = 0x{:08x}", key, value);
                Ok(*value)
            }
            other => Err(ProtocolError::OutputCount {
                expected: 1,
                actual: other.len(),
            }),
        }
    }

    /// Write a mux state key
    ///
    /// Writes to [`MuxStateKey::SwitchPolicy`] are checked against
    /// [`SwitchPolicy`] first; reserved and unknown values never reach the driver.
    pub fn set_state(
        &mut self,
        handle: ChannelHandle,
        key: MuxStateKey,
        arg: u64,
    ) -> Result<(), ProtocolError> {
        if key == MuxStateKey::SwitchPolicy {
            match SwitchPolicy::from_value(arg) {
                Some(policy) if policy.is_settable() => {}
                _ => {
                    warn!("refusing to write switch policy {}", arg);
                    return Err(ProtocolError::UnsupportedPolicyValue(arg));
                }
            }
        }

        self.execute(handle, MuxRequest::set(key, arg))?;
        debug!("set {} = 0x{:08x}", key, arg);
        Ok(())
    }

    /// Write the switch policy
    pub fn set_switch_policy(
        &mut self,
        handle: ChannelHandle,
        policy: SwitchPolicy,
    ) -> Result<(), ProtocolError> {
        self.set_state(handle, MuxStateKey::SwitchPolicy, policy.value())
    }

    /// Read the raw debug value
    pub fn debug_value(&mut self, handle: ChannelHandle) -> Result<u64, ProtocolError> {
        self.get_state(handle, MuxStateKey::Debug)
    }

    /// Write the raw debug value
    pub fn set_debug_value(
        &mut self,
        handle: ChannelHandle,
        value: u64,
    ) -> Result<(), ProtocolError> {
        self.set_state(handle, MuxStateKey::Debug, value)
    }

    fn execute(
        &mut self,
        handle: ChannelHandle,
        request: MuxRequest,
    ) -> Result<Vec<u64>, ProtocolError> {
        if !self.channel.is_open(handle) {
            return Err(ProtocolError::InvalidHandle);
        }
        request.validate()?;

        let op = request.operation();
        let expected = request.output_count();
        let outputs = self
            .channel
            .call(handle, op, &request.encode(), expected)
            .map_err(|e| {
                warn!("{} {} returned 0x{:08x}", op, request.key(), e.raw_code);
                ProtocolError::Channel {
                    op,
                    raw_code: e.raw_code,
                }
            })?;

        if outputs.len() != expected {
            return Err(ProtocolError::OutputCount {
                expected,
                actual: outputs.len(),
            });
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChannelError;
    use crate::selector::OperationCode;
    use crate::IO_RETURN_BUSY;

    /// Channel that answers every call with a fixed result and records inputs
    #[derive(Default)]
    struct ScriptedChannel {
        calls: Vec<(OperationCode, Vec<u64>)>,
        reply: Vec<u64>,
        fail_with: Option<i32>,
    }

    impl MuxChannel for ScriptedChannel {
        fn call(
            &mut self,
            _handle: ChannelHandle,
            op: OperationCode,
            inputs: &[u64],
            _output_count: usize,
        ) -> Result<Vec<u64>, ChannelError> {
            self.calls.push((op, inputs.to_vec()));
            match self.fail_with {
                Some(code) => Err(ChannelError::new(code)),
                None => Ok(self.reply.clone()),
            }
        }
    }

    const OPEN: ChannelHandle = ChannelHandle(7);

    #[test]
    fn test_get_state_sends_leading_constant() {
        let mut proto = MuxProtocol::new(ScriptedChannel {
            reply: vec![0xdead_beef_0000_0001],
            ..Default::default()
        });

        let value = proto.get_state(OPEN, MuxStateKey::FeatureInfo).unwrap();

        assert_eq!(value, 0xdead_beef_0000_0001);
        assert_eq!(
            proto.channel().calls,
            vec![(OperationCode::GetMuxState, vec![1, 0])]
        );
    }

    #[test]
    fn test_set_state_sends_three_scalars() {
        let mut proto = MuxProtocol::new(ScriptedChannel::default());

        proto.set_state(OPEN, MuxStateKey::GpuSelect, 1).unwrap();

        assert_eq!(
            proto.channel().calls,
            vec![(OperationCode::SetMuxState, vec![1, 4, 1])]
        );
    }

    #[test]
    fn test_channel_failure_carries_raw_code() {
        let mut proto = MuxProtocol::new(ScriptedChannel {
            fail_with: Some(IO_RETURN_BUSY),
            ..Default::default()
        });

        let err = proto.get_state(OPEN, MuxStateKey::ActiveCard).unwrap_err();

        assert_eq!(err.raw_code(), Some(IO_RETURN_BUSY));
        assert!(matches!(
            err,
            ProtocolError::Channel {
                op: OperationCode::GetMuxState,
                ..
            }
        ));
    }

    #[test]
    fn test_null_handle_never_reaches_channel() {
        let mut proto = MuxProtocol::new(ScriptedChannel::default());

        let err = proto
            .set_state(ChannelHandle::NULL, MuxStateKey::GpuSelect, 0)
            .unwrap_err();

        assert_eq!(err, ProtocolError::InvalidHandle);
        assert!(proto.channel().calls.is_empty());
    }

    #[test]
    fn test_reserved_policy_rejected_before_call() {
        let mut proto = MuxProtocol::new(ScriptedChannel::default());

        for value in [1, 3, 4, u64::MAX] {
            let err = proto
                .set_state(OPEN, MuxStateKey::SwitchPolicy, value)
                .unwrap_err();
            assert_eq!(err, ProtocolError::UnsupportedPolicyValue(value));
        }
        assert!(proto.channel().calls.is_empty());

        proto.set_switch_policy(OPEN, SwitchPolicy::Legacy).unwrap();
        assert_eq!(proto.channel().calls.len(), 1);
    }

    #[test]
    fn test_wrong_direction_rejected_before_call() {
        let mut proto = MuxProtocol::new(ScriptedChannel::default());

        let err = proto.set_state(OPEN, MuxStateKey::ActiveCard, 0).unwrap_err();

        assert!(matches!(err, ProtocolError::WrongDirection { .. }));
        assert!(proto.channel().calls.is_empty());
    }

    #[test]
    fn test_missing_output_scalar() {
        let mut proto = MuxProtocol::new(ScriptedChannel::default());

        let err = proto.get_state(OPEN, MuxStateKey::GpuSelect).unwrap_err();

        assert_eq!(
            err,
            ProtocolError::OutputCount {
                expected: 1,
                actual: 0
            }
        );
    }
}
