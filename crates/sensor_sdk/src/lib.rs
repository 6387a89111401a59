//! # Sensor SDK
//!
//! In-process stand-in for the vendor sensor SDK.
//!
//! Responsibilities:
//! - Implement the `SensorSdk` boundary (global callback slots, error codes)
//! - Simulate sensors that emit image-space batches on their own threads
//! - Model capture replay (open / loop / resume)
//! - Inject failures per SDK call for tests

mod mock_sdk;
mod simulator;
mod slots;

pub use contracts::SensorSdk;
pub use mock_sdk::{CaptureState, MockSdk, MockSdkConfig};
pub use simulator::{emit_interval, generate_batch};
