//! Directory of consume channels keyed by queue name.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::lifecycle::ConsumeChannel;

/// Live consume channels, one per queue.
///
/// Owned by the service context and passed by reference to whatever needs
/// channel lookup; entries are registered when the context is built and
/// removed when a queue is deconfigured. Not a global.
#[derive(Default)]
pub struct ChannelDirectory {
    channels: RwLock<HashMap<String, Arc<ConsumeChannel>>>,
}

impl ChannelDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel under its queue name, replacing any previous one.
    pub fn insert(&self, channel: Arc<ConsumeChannel>) {
        self.channels
            .write()
            .unwrap()
            .insert(channel.queue_name().to_string(), channel);
    }

    /// The channel consuming `queue_name`, if one is registered.
    #[must_use]
    pub fn lookup(&self, queue_name: &str) -> Option<Arc<ConsumeChannel>> {
        self.channels.read().unwrap().get(queue_name).cloned()
    }

    /// Deregister and return the channel for `queue_name`.
    pub fn remove(&self, queue_name: &str) -> Option<Arc<ConsumeChannel>> {
        self.channels.write().unwrap().remove(queue_name)
    }

    /// All registered channels, in no particular order.
    #[must_use]
    pub fn channels(&self) -> Vec<Arc<ConsumeChannel>> {
        self.channels.read().unwrap().values().cloned().collect()
    }

    /// All registered queue names, in no particular order.
    #[must_use]
    pub fn queue_names(&self) -> Vec<String> {
        self.channels.read().unwrap().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.read().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_lookup_remove_round_trip() {
        let directory = ChannelDirectory::new();
        directory.insert(ConsumeChannel::new("orders", "svc1"));

        let found = directory.lookup("orders").expect("channel registered");
        assert_eq!(found.queue_name(), "orders");
        assert_eq!(directory.len(), 1);

        assert!(directory.remove("orders").is_some());
        assert!(directory.is_empty());
    }

    #[test]
    fn lookup_of_an_unknown_queue_is_none() {
        let directory = ChannelDirectory::new();
        assert!(directory.lookup("missing").is_none());
        assert!(directory.remove("missing").is_none());
    }

    #[test]
    fn insert_replaces_an_existing_entry() {
        let directory = ChannelDirectory::new();
        directory.insert(ConsumeChannel::new("orders", "svc1"));
        directory.insert(ConsumeChannel::new("orders", "svc2"));

        assert_eq!(directory.len(), 1);
        let found = directory.lookup("orders").expect("channel registered");
        assert_eq!(found.app_id(), "svc2");
    }
}
