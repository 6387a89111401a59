//! MemoryTransport - keeps every published message for inspection

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{Channel, ContractError, Message, Transport};
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    /// (topic, queue_size) in advertise order
    advertised: Vec<(String, usize)>,
    /// (topic, message) in publish order
    published: Vec<(String, Message)>,
    fail_advertise: HashSet<String>,
    fail_publish: HashSet<String>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory transport
///
/// Clones share the same storage, so a test can keep one handle while the
/// bridge owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later advertise of `topic` fail
    pub fn fail_advertise(&self, topic: impl Into<String>) {
        lock(&self.state).fail_advertise.insert(topic.into());
    }

    /// Make every later publish on `topic` fail
    pub fn fail_publish(&self, topic: impl Into<String>) {
        lock(&self.state).fail_publish.insert(topic.into());
    }

    /// Clear injected failures
    pub fn heal(&self) {
        let mut state = lock(&self.state);
        state.fail_advertise.clear();
        state.fail_publish.clear();
    }

    /// Every successful advertise as (topic, queue_size)
    pub fn advertised(&self) -> Vec<(String, usize)> {
        lock(&self.state).advertised.clone()
    }

    /// Number of advertise calls that created a channel for `topic`
    pub fn advertise_count(&self, topic: &str) -> usize {
        lock(&self.state)
            .advertised
            .iter()
            .filter(|(t, _)| t == topic)
            .count()
    }

    /// Every published message as (topic, message), oldest first
    pub fn published(&self) -> Vec<(String, Message)> {
        lock(&self.state).published.clone()
    }

    /// Messages published on `topic`, oldest first
    pub fn messages_on(&self, topic: &str) -> Vec<Message> {
        lock(&self.state)
            .published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn published_count(&self) -> usize {
        lock(&self.state).published.len()
    }

    /// Drop recorded messages, keeping channels and injected failures
    pub fn clear_published(&self) {
        lock(&self.state).published.clear();
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    fn advertise(&self, topic: &str, queue_size: usize) -> Result<Arc<dyn Channel>, ContractError> {
        let mut state = lock(&self.state);
        if state.fail_advertise.contains(topic) {
            return Err(ContractError::advertise(self.name(), topic, "injected failure"));
        }
        state.advertised.push((topic.to_string(), queue_size));
        debug!(topic, queue_size, "memory channel advertised");

        Ok(Arc::new(MemoryChannel {
            topic: topic.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemoryChannel {
    topic: String,
    state: Arc<Mutex<State>>,
}

impl Channel for MemoryChannel {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&self, message: Message) -> Result<(), ContractError> {
        let mut state = lock(&self.state);
        if state.fail_publish.contains(&self.topic) {
            return Err(ContractError::publish(&self.topic, "injected failure"));
        }
        state.published.push((self.topic.clone(), message));
        Ok(())
    }
}
