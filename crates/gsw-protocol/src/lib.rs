//! Graphics Mux Control Protocol
//!
//! This crate speaks the scalar request/response protocol exposed by the
//! graphics control driver that arbitrates the display multiplexer between
//! an integrated and a discrete GPU.
//!
//! # Architecture
//!
//! - [`OperationCode`]: the driver's method selectors (open, close, get/set mux state, ...)
//! - [`MuxStateKey`]: what a get/set mux-state call addresses, with its direction
//! - [`MuxRequest`]: encoding of a get/set request into the driver's scalar inputs
//! - [`MuxProtocol`]: get-state / set-state round-trips over a [`MuxChannel`]
//! - [`FeatureRegistry`]: the feature bitmask addressed by [`MuxStateKey::FeatureInfo`]
//!
//! The channel itself (locating the driver, opening and closing the session)
//! lives outside this crate. Callers hand in a [`MuxChannel`] implementation
//! together with the [`ChannelHandle`] it gave them.
//!
//! # Wire format
//!
//! - get-state: inputs `[1, key]`, exactly one output scalar
//! - set-state: inputs `[1, key, arg]`, no output scalars
//!
//! # Example
//!
//! ```rust
//! use gsw_protocol::{MuxRequest, MuxStateKey, OperationCode};
//!
//! let req = MuxRequest::set(MuxStateKey::GpuSelect, 1);
//! assert_eq!(req.operation(), OperationCode::SetMuxState);
//! assert_eq!(req.encode(), vec![1, 4, 1]);
//! ```

pub mod error;
pub mod feature;
pub mod key;
pub mod protocol;
pub mod request;
pub mod selector;

pub use error::{ChannelError, ProtocolError};
pub use feature::{FeatureBit, FeatureMask, FeatureRegistry};
pub use key::{KeyAccess, MuxStateKey, SwitchPolicy};
pub use protocol::MuxProtocol;
pub use request::{MuxRequest, MUX_CONTROL};
pub use selector::OperationCode;

/// Driver return code for a successful call
pub const KERN_SUCCESS: i32 = 0;
/// Generic driver failure
pub const KERN_FAILURE: i32 = 5;
/// The driver rejected an argument
pub const IO_RETURN_BAD_ARGUMENT: i32 = 0xE000_02C2_u32 as i32;
/// The operation is not supported on this hardware
pub const IO_RETURN_UNSUPPORTED: i32 = 0xE000_02C7_u32 as i32;
/// The driver is busy
pub const IO_RETURN_BUSY: i32 = 0xE000_02D5_u32 as i32;
/// The session is not open
pub const IO_RETURN_NOT_OPEN: i32 = 0xE000_02CD_u32 as i32;

/// Opaque identifier for an open session with the driver
///
/// Handles are issued and retired by the channel owner. The zero handle is
/// never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelHandle(pub u32);

impl ChannelHandle {
    /// The null handle (no open session)
    pub const NULL: ChannelHandle = ChannelHandle(0);

    /// Get the raw handle value
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns true unless this is the null handle
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

/// Bidirectional scalar call interface to the driver
///
/// Implementations perform one blocking round-trip per call. A call that the
/// driver rejects returns its raw return code in [`ChannelError`].
pub trait MuxChannel {
    /// Invoke `op` with scalar `inputs`, expecting `output_count` scalar outputs
    fn call(
        &mut self,
        handle: ChannelHandle,
        op: OperationCode,
        inputs: &[u64],
        output_count: usize,
    ) -> Result<Vec<u64>, ChannelError>;

    /// Whether `handle` currently refers to an open session
    ///
    /// The default only rejects the null handle; channels that track their
    /// sessions should also reject closed ones.
    fn is_open(&self, handle: ChannelHandle) -> bool {
        handle.is_valid()
    }
}

impl<C: MuxChannel + ?Sized> MuxChannel for &mut C {
    fn call(
        &mut self,
        handle: ChannelHandle,
        op: OperationCode,
        inputs: &[u64],
        output_count: usize,
    ) -> Result<Vec<u64>, ChannelError> {
        (**self).call(handle, op, inputs, output_count)
    }

    fn is_open(&self, handle: ChannelHandle) -> bool {
        (**self).is_open(handle)
    }
}

impl<C: MuxChannel + ?Sized> MuxChannel for Box<C> {
    fn call(
        &mut self,
        handle: ChannelHandle,
        op: OperationCode,
        inputs: &[u64],
        output_count: usize,
    ) -> Result<Vec<u64>, ChannelError> {
        (**self).call(handle, op, inputs, output_count)
    }

    fn is_open(&self, handle: ChannelHandle) -> bool {
        (**self).is_open(handle)
    }
}
