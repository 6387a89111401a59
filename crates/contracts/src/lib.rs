//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the bridge.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Boundaries
//! - [`SensorSdk`]: the vendor SDK (global callback slots, integer error codes)
//! - [`Transport`] / [`Channel`]: the host publish/subscribe middleware
//!
//! ## Time Model
//! - Point timestamps are SDK microseconds (`i64`)
//! - Message stamps are batch-arrival wall-clock time ([`Time`])

mod config;
mod error;
mod message;
mod point;
mod sdk;
mod sensor_id;
mod transport;

pub use config::*;
pub use error::*;
pub use message::*;
pub use point::*;
pub use sdk::*;
pub use sensor_id::{SensorHandle, SerialNumber};
pub use transport::*;
