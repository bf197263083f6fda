//! Graphics Mux Switch-Mode Controller
//!
//! This crate turns a high-level intent for a dual-GPU laptop into the
//! sequence of mux state operations that carries it out.
//!
//! # Architecture
//!
//! The controller drives a [`gsw_protocol::MuxProtocol`] over a caller-supplied
//! channel. It supports four switch modes:
//!
//! - **ForceIntegrated / ForceDiscrete**: turn dynamic switching off, stop the
//!   driver from switching back on its own, wait for the readback to settle,
//!   and force-switch only if the wrong card is active
//! - **DynamicSwitching**: restore the driver's own switching policy
//! - **ToggleNow**: force-switch immediately
//!
//! Every transition either returns a [`TransitionReport`] or a
//! [`SwitchError::PartialTransition`] naming the step that failed. Steps are
//! recorded as [`SwitchEvent`]s that the caller drains after each call.
//!
//! # Example
//!
//! ```rust
//! use gsw_mux::{ControllerConfig, SwitchMode, SwitchModeController};
//! use gsw_sim::SimulatedDriver;
//!
//! let mut driver = SimulatedDriver::new();
//! let handle = driver.open();
//!
//! let mut ctl = SwitchModeController::with_config(driver, ControllerConfig::without_settle());
//! let report = ctl.set_mode(handle, SwitchMode::ForceDiscrete).unwrap();
//!
//! assert!(report.force_switched);
//! assert!(!ctl.is_using_integrated(handle).unwrap());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod settle;
pub mod state;

pub use config::{ControllerConfig, DEFAULT_SETTLE_DELAY_MS};
pub use engine::{SwitchModeController, TransitionReport};
pub use error::{ParseModeError, SwitchError};
pub use events::SwitchEvent;
pub use settle::{Settle, ThreadSleep};
pub use state::{Gpu, SwitchMode, TransitionStep};
