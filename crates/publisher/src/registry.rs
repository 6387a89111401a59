//! PublisherRegistry - lazily created, cached channels per key

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{MessageKind, Transport};
use tracing::{debug, info, instrument};

use crate::addressing::{AddressingPolicy, PublisherKey, TopicNaming};
use crate::error::{PublisherError, Result};
use crate::metrics::{MeteredChannel, MetricsSnapshot};

/// Channel cache for one point-cloud message kind
///
/// A channel is created the first time its key is resolved and reused for the
/// lifetime of the registry. The map sits behind one lock; creation happens
/// under that lock so two racing callers never advertise the same topic twice.
pub struct PublisherRegistry {
    kind: MessageKind,
    naming: TopicNaming,
    transport: Arc<dyn Transport>,
    channels: Mutex<HashMap<PublisherKey, Arc<MeteredChannel>>>,
}

impl PublisherRegistry {
    pub fn new(kind: MessageKind, naming: TopicNaming, transport: Arc<dyn Transport>) -> Self {
        Self {
            kind,
            naming,
            transport,
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PublisherKey, Arc<MeteredChannel>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn naming(&self) -> &TopicNaming {
        &self.naming
    }

    /// Channel for `key`, created on first use.
    ///
    /// # Errors
    /// `ChannelCreation` when the transport refuses; nothing is cached, so a
    /// later call retries.
    pub fn resolve(&self, key: PublisherKey) -> Result<Arc<MeteredChannel>> {
        let mut channels = self.lock();
        if let Some(channel) = channels.get(&key) {
            return Ok(Arc::clone(channel));
        }

        let topic = self.naming.topic(self.kind, key);
        let queue_size = self.naming.queue_size(self.kind, key);
        let channel = self
            .transport
            .advertise(&topic, queue_size)
            .map_err(|e| PublisherError::channel_creation(&topic, e))?;

        let channel = Arc::new(MeteredChannel::new(channel));
        channels.insert(key, Arc::clone(&channel));
        debug!(kind = self.kind.as_str(), %key, topic = %topic, queue_size, "channel created");
        Ok(channel)
    }

    /// Create the shared channel up front in combined mode. No-op per sensor.
    #[instrument(name = "registry_prewarm", skip(self), fields(kind = self.kind.as_str()))]
    pub fn prewarm(&self) -> Result<()> {
        if self.naming.policy() == AddressingPolicy::Combined {
            let channel = self.resolve(PublisherKey::Combined)?;
            info!(topic = %channel.inner().topic(), "combined channel ready");
        }
        Ok(())
    }

    /// Per-topic metrics, sorted by topic
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        let mut metrics: Vec<_> = self
            .lock()
            .values()
            .map(|c| (c.inner().topic().to_string(), c.metrics().snapshot()))
            .collect();
        metrics.sort_by(|a, b| a.0.cmp(&b.0));
        metrics
    }

    /// Topics created so far, sorted
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<_> = self
            .lock()
            .values()
            .map(|c| c.inner().topic().to_string())
            .collect();
        topics.sort();
        topics
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
