//! Simulated graphics control driver
//!
//! Answers mux state requests from an in-memory [`DriverState`], echoing
//! writes into later reads, and records every call it receives.

use std::collections::BTreeSet;

use gsw_protocol::{
    ChannelError, ChannelHandle, FeatureBit, MuxChannel, MuxRequest, MuxStateKey,
    OperationCode, IO_RETURN_BAD_ARGUMENT, IO_RETURN_NOT_OPEN, IO_RETURN_UNSUPPORTED,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Power state reported while only the integrated GPU is powered
pub const POWER_INTEGRATED: u64 = 0x8;
/// Power state reported while both GPUs are powered
pub const POWER_BOTH: u64 = 0x88;

/// Driver-side state of the simulated mux
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverState {
    /// Raw feature mask
    pub feature_mask: u64,
    /// Dynamic switching (GpuSelect) value
    pub gpu_select: u64,
    /// Raw switch policy value
    pub switch_policy: u64,
    /// Active card: 0 integrated, 1 discrete
    pub active_card: u64,
    /// GPU power state
    pub power_gpu: u64,
    /// Debug value
    pub debug: u64,
}

impl Default for DriverState {
    fn default() -> Self {
        Self {
            feature_mask: FeatureBit::Policy.mask()
                | FeatureBit::AutoPowerDownGpu.mask()
                | FeatureBit::DynamicSwitching.mask()
                | FeatureBit::DeferPolicy.mask()
                | FeatureBit::BacklightControl.mask(),
            gpu_select: 1,
            switch_policy: 0,
            active_card: 0,
            power_gpu: POWER_INTEGRATED,
            debug: 0,
        }
    }
}

impl DriverState {
    /// Start on the discrete GPU
    pub fn on_discrete(mut self) -> Self {
        self.active_card = 1;
        self.power_gpu = POWER_BOTH;
        self
    }

    /// Start on the integrated GPU
    pub fn on_integrated(mut self) -> Self {
        self.active_card = 0;
        self.power_gpu = POWER_INTEGRATED;
        self
    }

    fn read(&self, key: MuxStateKey) -> Option<u64> {
        match key {
            MuxStateKey::FeatureInfo | MuxStateKey::FeatureInfo2 => Some(self.feature_mask),
            MuxStateKey::PowerGpu => Some(self.power_gpu),
            MuxStateKey::GpuSelect => Some(self.gpu_select),
            MuxStateKey::SwitchPolicy => Some(self.switch_policy),
            MuxStateKey::ActiveCard => Some(self.active_card),
            MuxStateKey::Debug => Some(self.debug),
            MuxStateKey::DisableFeature | MuxStateKey::EnableFeature | MuxStateKey::ForceSwitch => {
                None
            }
        }
    }

    fn write(&mut self, key: MuxStateKey, arg: u64) -> bool {
        match key {
            MuxStateKey::DisableFeature => self.feature_mask &= !arg,
            MuxStateKey::EnableFeature => self.feature_mask |= arg,
            MuxStateKey::ForceSwitch => {
                if self.active_card == 0 {
                    self.active_card = 1;
                    self.power_gpu = POWER_BOTH;
                } else {
                    self.active_card = 0;
                    self.power_gpu = POWER_INTEGRATED;
                }
            }
            MuxStateKey::PowerGpu => self.power_gpu = arg,
            MuxStateKey::GpuSelect => self.gpu_select = arg,
            MuxStateKey::SwitchPolicy => self.switch_policy = arg,
            MuxStateKey::Debug => self.debug = arg,
            MuxStateKey::FeatureInfo | MuxStateKey::FeatureInfo2 | MuxStateKey::ActiveCard => {
                return false
            }
        }
        true
    }
}

/// Which calls an injected fault applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Any get-mux-state of this key
    Get(MuxStateKey),
    /// Any set-mux-state of this key
    Set(MuxStateKey),
    /// Every call
    Any,
}

impl Fault {
    fn matches(&self, request: &MuxRequest) -> bool {
        match (self, request) {
            (Self::Any, _) => true,
            (Self::Get(k), MuxRequest::Get { key }) => k == key,
            (Self::Set(k), MuxRequest::Set { key, .. }) => k == key,
            _ => false,
        }
    }
}

/// One call received by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Handle the call was made on
    pub handle: ChannelHandle,
    /// Driver operation
    pub op: OperationCode,
    /// Raw scalar inputs
    pub inputs: Vec<u64>,
}

impl CallRecord {
    /// Decode the call as a mux state request
    pub fn request(&self) -> Option<MuxRequest> {
        MuxRequest::decode(self.op, &self.inputs)
    }
}

/// In-memory stand-in for the graphics control driver
#[derive(Debug)]
pub struct SimulatedDriver {
    state: DriverState,
    open_handles: BTreeSet<ChannelHandle>,
    next_handle: u32,
    calls: Vec<CallRecord>,
    faults: Vec<(Fault, i32)>,
}

impl SimulatedDriver {
    /// Create a driver with default state
    pub fn new() -> Self {
        Self::with_state(DriverState::default())
    }

    /// Create a driver starting from `state`
    pub fn with_state(state: DriverState) -> Self {
        Self {
            state,
            open_handles: BTreeSet::new(),
            next_handle: 1,
            calls: Vec::new(),
            faults: Vec::new(),
        }
    }

    /// Open a session and return its handle
    pub fn open(&mut self) -> ChannelHandle {
        let handle = ChannelHandle(self.next_handle);
        self.next_handle += 1;
        self.open_handles.insert(handle);
        debug!("opened channel {}", handle.as_u32());
        handle
    }

    /// Close a session; returns false if it was not open
    pub fn close(&mut self, handle: ChannelHandle) -> bool {
        let closed = self.open_handles.remove(&handle);
        if closed {
            debug!("closed channel {}", handle.as_u32());
        }
        closed
    }

    /// Current driver state
    pub fn state(&self) -> &DriverState {
        &self.state
    }

    /// Mutable driver state, for arranging test scenarios
    pub fn state_mut(&mut self) -> &mut DriverState {
        &mut self.state
    }

    /// Fail every call matching `fault` with `raw_code`
    pub fn inject_fault(&mut self, fault: Fault, raw_code: i32) {
        self.faults.push((fault, raw_code));
    }

    /// Remove all injected faults
    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    /// Forget recorded calls
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Recorded calls decoded as mux state requests
    pub fn requests(&self) -> Vec<MuxRequest> {
        self.calls.iter().filter_map(CallRecord::request).collect()
    }

    /// Number of force-switch requests received
    pub fn force_switch_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| matches!(r, MuxRequest::Set { key: MuxStateKey::ForceSwitch, .. }))
            .count()
    }

    fn dispatch(
        &mut self,
        op: OperationCode,
        inputs: &[u64],
        output_count: usize,
    ) -> Result<Vec<u64>, i32> {
        match op {
            OperationCode::Open | OperationCode::Close => return Ok(Vec::new()),
            OperationCode::GetMuxState | OperationCode::SetMuxState => {}
            _ => return Err(IO_RETURN_UNSUPPORTED),
        }

        let request = MuxRequest::decode(op, inputs).ok_or(IO_RETURN_BAD_ARGUMENT)?;
        if output_count != request.output_count() {
            return Err(IO_RETURN_BAD_ARGUMENT);
        }
        if let Some((_, code)) = self.faults.iter().find(|(f, _)| f.matches(&request)) {
            return Err(*code);
        }

        match request {
            MuxRequest::Get { key } => self
                .state
                .read(key)
                .map(|value| vec![value])
                .ok_or(IO_RETURN_BAD_ARGUMENT),
            MuxRequest::Set { key, arg } => {
                if self.state.write(key, arg) {
                    Ok(Vec::new())
                } else {
                    Err(IO_RETURN_BAD_ARGUMENT)
                }
            }
        }
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MuxChannel for SimulatedDriver {
    fn call(
        &mut self,
        handle: ChannelHandle,
        op: OperationCode,
        inputs: &[u64],
        output_count: usize,
    ) -> Result<Vec<u64>, ChannelError> {
        self.calls.push(CallRecord {
            handle,
            op,
            inputs: inputs.to_vec(),
        });

        if !self.open_handles.contains(&handle) {
            return Err(ChannelError::new(IO_RETURN_NOT_OPEN));
        }

        let result = self.dispatch(op, inputs, output_count);
        trace!("{} {:?} -> {:?}", op, inputs, result);
        result.map_err(ChannelError::new)
    }

    fn is_open(&self, handle: ChannelHandle) -> bool {
        self.open_handles.contains(&handle)
    }
}
