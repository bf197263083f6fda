//! Switch-mode controller
//!
//! Turns a [`SwitchMode`] into the ordered sequence of mux state writes and
//! reads that applies it. Each call runs to completion or stops at the first
//! failed step; nothing is retried and no state is kept between calls.

use std::time::Duration;

use gsw_protocol::{
    ChannelHandle, FeatureBit, FeatureMask, MuxChannel, MuxProtocol, MuxStateKey, ProtocolError,
    SwitchPolicy,
};
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::SwitchError;
use crate::events::SwitchEvent;
use crate::settle::{Settle, ThreadSleep};
use crate::state::{Gpu, SwitchMode, TransitionStep};

/// Result of a completed transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReport {
    /// Mode that was applied
    pub mode: SwitchMode,
    /// Steps that ran, in order
    pub completed_steps: Vec<TransitionStep>,
    /// Active card read before deciding whether to switch (force modes)
    pub observed: Option<Gpu>,
    /// Whether a force-switch was sent
    pub force_switched: bool,
}

/// Bookkeeping for one transition in progress
struct Transition {
    mode: SwitchMode,
    completed: Vec<TransitionStep>,
}

impl Transition {
    fn new(mode: SwitchMode, events: &mut Vec<SwitchEvent>) -> Self {
        events.push(SwitchEvent::TransitionStarted { mode });
        Self {
            mode,
            completed: Vec::new(),
        }
    }

    fn complete(&mut self, events: &mut Vec<SwitchEvent>, step: TransitionStep) {
        self.completed.push(step);
        events.push(SwitchEvent::StepCompleted { step });
    }

    fn note_failure(
        &self,
        events: &mut Vec<SwitchEvent>,
        step: TransitionStep,
        error: &ProtocolError,
    ) {
        warn!("{}: step {} failed: {}", self.mode, step, error);
        events.push(SwitchEvent::StepFailed {
            step,
            raw_code: error.raw_code(),
        });
    }

    fn abort(
        &mut self,
        events: &mut Vec<SwitchEvent>,
        failed_step: TransitionStep,
        source: ProtocolError,
    ) -> SwitchError {
        events.push(SwitchEvent::TransitionAborted {
            mode: self.mode,
            failed_step,
        });
        SwitchError::PartialTransition {
            mode: self.mode,
            completed_steps: std::mem::take(&mut self.completed),
            failed_step,
            source,
        }
    }

    /// A step the rest of the transition depends on
    fn require<T>(
        &mut self,
        events: &mut Vec<SwitchEvent>,
        step: TransitionStep,
        result: Result<T, ProtocolError>,
    ) -> Result<T, SwitchError> {
        match result {
            Ok(value) => {
                self.complete(events, step);
                Ok(value)
            }
            Err(e) => {
                self.note_failure(events, step, &e);
                Err(self.abort(events, step, e))
            }
        }
    }

    /// Independent steps that have all been attempted; the first failure stops the transition
    fn require_each(
        &mut self,
        events: &mut Vec<SwitchEvent>,
        results: Vec<(TransitionStep, Result<(), ProtocolError>)>,
    ) -> Result<(), SwitchError> {
        let mut first_failure = None;
        for (step, result) in results {
            match result {
                Ok(()) => self.complete(events, step),
                Err(e) => {
                    self.note_failure(events, step, &e);
                    first_failure.get_or_insert((step, e));
                }
            }
        }
        match first_failure {
            Some((step, e)) => Err(self.abort(events, step, e)),
            None => Ok(()),
        }
    }

    fn settled(&mut self, events: &mut Vec<SwitchEvent>, delay: Duration) {
        self.completed.push(TransitionStep::Settle);
        events.push(SwitchEvent::Settled { delay });
    }

    fn finish(
        self,
        events: &mut Vec<SwitchEvent>,
        observed: Option<Gpu>,
        force_switched: bool,
    ) -> TransitionReport {
        events.push(SwitchEvent::TransitionCompleted {
            mode: self.mode,
            force_switched,
        });
        info!(
            "{} complete ({} steps{})",
            self.mode,
            self.completed.len(),
            if force_switched { ", switched" } else { "" }
        );
        TransitionReport {
            mode: self.mode,
            completed_steps: self.completed,
            observed,
            force_switched,
        }
    }
}

/// Applies switch modes over a mux channel
///
/// The controller owns the channel but never opens or closes a session; the
/// caller passes the [`ChannelHandle`] it obtained into every call. One
/// controller must not be driven from more than one thread at a time.
pub struct SwitchModeController<C, S = ThreadSleep> {
    protocol: MuxProtocol<C>,
    settle: S,
    config: ControllerConfig,
    event_buffer: Vec<SwitchEvent>,
}

impl<C: MuxChannel> SwitchModeController<C, ThreadSleep> {
    /// Create a controller with default configuration
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, ControllerConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(channel: C, config: ControllerConfig) -> Self {
        Self::with_settle(channel, config, ThreadSleep)
    }
}

impl<C: MuxChannel, S: Settle> SwitchModeController<C, S> {
    /// Create with custom configuration and settle implementation
    pub fn with_settle(channel: C, config: ControllerConfig, settle: S) -> Self {
        Self {
            protocol: MuxProtocol::new(channel),
            settle,
            config,
            event_buffer: Vec::new(),
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Update the configuration
    pub fn set_config(&mut self, config: ControllerConfig) {
        self.config = config;
    }

    /// Access the underlying protocol
    pub fn protocol_mut(&mut self) -> &mut MuxProtocol<C> {
        &mut self.protocol
    }

    /// Access the underlying channel
    pub fn channel(&self) -> &C {
        self.protocol.channel()
    }

    /// Mutable access to the underlying channel
    pub fn channel_mut(&mut self) -> &mut C {
        self.protocol.channel_mut()
    }

    /// Unwrap the underlying channel
    pub fn into_channel(self) -> C {
        self.protocol.into_inner()
    }

    /// Drain pending events
    pub fn drain_events(&mut self) -> Vec<SwitchEvent> {
        std::mem::take(&mut self.event_buffer)
    }

    /// Apply a switch mode
    pub fn set_mode(
        &mut self,
        handle: ChannelHandle,
        mode: SwitchMode,
    ) -> Result<TransitionReport, SwitchError> {
        info!("applying {}", mode);
        match mode {
            SwitchMode::ForceIntegrated => self.force(handle, mode, Gpu::Integrated),
            SwitchMode::ForceDiscrete => self.force(handle, mode, Gpu::Discrete),
            SwitchMode::DynamicSwitching => self.enable_dynamic(handle, mode),
            SwitchMode::ToggleNow => self.toggle(handle, mode),
        }
    }

    /// Pin the display to `target`
    fn force(
        &mut self,
        handle: ChannelHandle,
        mode: SwitchMode,
        target: Gpu,
    ) -> Result<TransitionReport, SwitchError> {
        let events = &mut self.event_buffer;
        let mut t = Transition::new(mode, events);

        // Everything after this depends on dynamic switching being off
        let result = self.protocol.set_state(handle, MuxStateKey::GpuSelect, 0);
        t.require(events, TransitionStep::DisableDynamicSwitching, result)?;

        // Without clearing Policy the driver moves back to discrete when a demanding app exits
        let feature = self.protocol.features().set(handle, FeatureBit::Policy, false);
        let policy = self
            .protocol
            .set_switch_policy(handle, SwitchPolicy::Legacy);
        t.require_each(
            events,
            vec![
                (TransitionStep::DisablePolicyFeature, feature),
                (TransitionStep::SetLegacyPolicy, policy),
            ],
        )?;

        let delay = self.config.settle_delay();
        debug!("settling for {:?}", delay);
        self.settle.settle(delay);
        t.settled(events, delay);

        let result = self
            .protocol
            .get_state(handle, MuxStateKey::ActiveCard)
            .map(|raw| self.config.decode_active_card(raw));
        let current = t.require(events, TransitionStep::ReadActiveCard, result)?;
        events.push(SwitchEvent::CardObserved { card: current });

        if current == target {
            debug!("{} already active", current);
            events.push(SwitchEvent::AlreadyActive { card: current });
            return Ok(t.finish(events, Some(current), false));
        }

        let result = self.protocol.set_state(handle, MuxStateKey::ForceSwitch, 0);
        t.require(events, TransitionStep::ForceSwitch, result)?;

        Ok(t.finish(events, Some(current), true))
    }

    /// Hand switching back to the driver
    fn enable_dynamic(
        &mut self,
        handle: ChannelHandle,
        mode: SwitchMode,
    ) -> Result<TransitionReport, SwitchError> {
        let events = &mut self.event_buffer;
        let mut t = Transition::new(mode, events);

        let feature = self.protocol.features().set(handle, FeatureBit::Policy, true);
        let policy = self
            .protocol
            .set_switch_policy(handle, SwitchPolicy::Dynamic);
        t.require_each(
            events,
            vec![
                (TransitionStep::EnablePolicyFeature, feature),
                (TransitionStep::SetDynamicPolicy, policy),
            ],
        )?;

        let result = self.protocol.set_state(handle, MuxStateKey::GpuSelect, 1);
        t.require(events, TransitionStep::EnableDynamicSwitching, result)?;

        Ok(t.finish(events, None, false))
    }

    /// Switch to the other GPU unconditionally
    fn toggle(
        &mut self,
        handle: ChannelHandle,
        mode: SwitchMode,
    ) -> Result<TransitionReport, SwitchError> {
        let events = &mut self.event_buffer;
        let mut t = Transition::new(mode, events);

        let result = self.protocol.set_state(handle, MuxStateKey::ForceSwitch, 0);
        t.require(events, TransitionStep::Toggle, result)?;

        Ok(t.finish(events, None, true))
    }

    /// GPU currently driving the display
    pub fn active_gpu(&mut self, handle: ChannelHandle) -> Result<Gpu, SwitchError> {
        let raw = self.protocol.get_state(handle, MuxStateKey::ActiveCard)?;
        Ok(self.config.decode_active_card(raw))
    }

    /// Whether the integrated GPU is driving the display
    pub fn is_using_integrated(&mut self, handle: ChannelHandle) -> Result<bool, SwitchError> {
        Ok(self.active_gpu(handle)? == Gpu::Integrated)
    }

    /// Whether dynamic switching is on
    pub fn is_using_dynamic_switching(
        &mut self,
        handle: ChannelHandle,
    ) -> Result<bool, SwitchError> {
        Ok(self.protocol.get_state(handle, MuxStateKey::GpuSelect)? != 0)
    }

    /// Feature mask, for diagnostics
    pub fn feature_report(&mut self, handle: ChannelHandle) -> Result<FeatureMask, SwitchError> {
        Ok(self.protocol.features().mask(handle)?)
    }
}
