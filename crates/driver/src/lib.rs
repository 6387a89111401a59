//! # Driver
//!
//! Process-wide owner of the vendor SDK registration.
//!
//! The SDK exposes one global slot per callback kind and accepts bare function
//! pointers. The driver registers two trampolines in those slots and forwards
//! to closures supplied at `initialize`, so the rest of the bridge can hold
//! ordinary state.
//!
//! Responsibilities:
//! - Lifecycle state machine (Uninitialized → Initializing → Active → Deinitializing)
//! - Trampolines that forward only while Active
//! - Metadata lookup and capture replay through the registered SDK

mod driver;
mod error;
mod state;

pub use driver::{Driver, OnEventCallback, OnReceiveCallback};
pub use error::{DriverError, Result};
pub use state::DriverState;
