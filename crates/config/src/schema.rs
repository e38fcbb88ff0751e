//! Broker configuration schema.

use std::collections::HashSet;

use {
    serde::{Deserialize, Serialize},
    tracing::warn,
};

/// Top-level configuration for the broker consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Master switch for consuming.
    pub enabled: bool,
    /// Broker URI, e.g. `amqp://broker.internal:5672`.
    pub service_uri: String,
    /// Username presented to the broker.
    pub user_name: String,
    /// Queues to consume, in declaration order.
    #[serde(rename = "queue")]
    pub queues: Vec<QueueDescriptor>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_uri: "amqp://localhost:5672".into(),
            user_name: "guest".into(),
            queues: Vec::new(),
        }
    }
}

impl BrokerConfig {
    /// Drop queues with duplicate names, keeping the first occurrence.
    ///
    /// The queue name is the unique key for channel lookup; later
    /// duplicates are logged and discarded.
    #[must_use]
    pub fn deduped(mut self) -> Self {
        let mut seen = HashSet::new();
        self.queues.retain(|queue| {
            let fresh = seen.insert(queue.queue_name.clone());
            if !fresh {
                warn!(queue = %queue.queue_name, "duplicate queue in configuration, keeping the first entry");
            }
            fresh
        });
        self
    }
}

/// One queue to consume from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDescriptor {
    /// Queue name; unique key across the configuration.
    pub queue_name: String,
    /// Application id tag, informational.
    #[serde(default)]
    pub app_id: String,
}
