//! # Bridge
//!
//! Turns SDK batches into published messages.
//!
//! Responsibilities:
//! - Assemble one owned frame per SDK callback
//! - Convert image-space points to Cartesian, skipping points without return
//! - Publish metadata, image-space and Cartesian messages per batch
//! - Wire everything to the driver singleton (`DriverNode`)

mod error;
mod frame;
mod node;
mod processor;

pub use error::{BridgeError, Result};
pub use frame::{CoordinateConverter, Frame, FrameAssembler};
pub use node::{DriverNode, NodeStats};
pub use processor::{BatchProcessor, BatchReport};
