//! Transport implementations
//!
//! Contains LogTransport, FileTransport, and MemoryTransport.

mod file;
mod log;
mod memory;

use std::sync::Arc;

use contracts::{Transport, TransportConfig, TransportType};
use tracing::instrument;

use crate::error::{PublisherError, Result};

pub use self::file::{read_messages, FileFormat, FileTransport, FileTransportConfig};
pub use self::log::LogTransport;
pub use self::memory::MemoryTransport;

/// Create a transport from configuration
#[instrument(name = "publisher_create_transport", skip(config), fields(transport_type = ?config.transport_type))]
pub fn create_transport(config: &TransportConfig) -> Result<Arc<dyn Transport>> {
    match config.transport_type {
        TransportType::Log => Ok(Arc::new(LogTransport::default())),
        TransportType::File => {
            let transport = FileTransport::from_params(&config.params)
                .map_err(|e| PublisherError::transport_creation("file", e.to_string()))?;
            Ok(Arc::new(transport))
        }
        TransportType::Memory => Ok(Arc::new(MemoryTransport::new())),
    }
}
