//! Graphics Mux Simulation Library
//!
//! This crate provides a simulated graphics control driver for exercising the
//! mux protocol and switch-mode controller without switchable hardware.
//!
//! - **SimulatedDriver**: implements `MuxChannel`, echoes writes into reads,
//!   flips the active card on force-switch, and records every call
//! - **Fault**: makes selected requests fail with a chosen driver return code
//!
//! # Example
//!
//! ```rust
//! use gsw_protocol::{MuxProtocol, MuxStateKey};
//! use gsw_sim::{DriverState, SimulatedDriver};
//!
//! let mut driver = SimulatedDriver::with_state(DriverState::default().on_discrete());
//! let handle = driver.open();
//!
//! let mut proto = MuxProtocol::new(driver);
//! assert_eq!(proto.get_state(handle, MuxStateKey::ActiveCard).unwrap(), 1);
//!
//! proto.set_state(handle, MuxStateKey::ForceSwitch, 0).unwrap();
//! assert_eq!(proto.get_state(handle, MuxStateKey::ActiveCard).unwrap(), 0);
//! ```

pub mod driver;

pub use driver::{CallRecord, DriverState, Fault, SimulatedDriver, POWER_BOTH, POWER_INTEGRATED};
