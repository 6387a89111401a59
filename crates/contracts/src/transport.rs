//! Transport / Channel traits - host middleware boundary

use std::sync::Arc;

use crate::{ContractError, Message};

/// A named output destination created through the host middleware.
///
/// Publishing is synchronous and bounded-latency; it is called directly from
/// SDK callback threads.
pub trait Channel: Send + Sync {
    /// Topic the channel was advertised on
    fn topic(&self) -> &str;

    /// Hand one message to the transport
    ///
    /// # Errors
    /// Returns publish error (should include context)
    fn publish(&self, message: Message) -> Result<(), ContractError>;
}

/// Host middleware handle able to create channels.
pub trait Transport: Send + Sync {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Create a channel for `topic`.
    ///
    /// Every call creates a new channel; caching is the caller's concern.
    fn advertise(&self, topic: &str, queue_size: usize) -> Result<Arc<dyn Channel>, ContractError>;
}
