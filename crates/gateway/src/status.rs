//! Point-in-time status snapshots of the configured queues.

use serde::Serialize;

use {warren_channels::ChannelDirectory, warren_config::BrokerConfig};

use crate::context::BrokerContext;

/// Read-only status of the broker consumer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerStatus {
    pub enabled: bool,
    pub connected: bool,
    pub service_uri: String,
    pub user_name: String,
    pub queues: Vec<QueueState>,
}

/// Consumption status of one configured queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    pub name: String,
    pub app_id: String,
    pub consumed: bool,
}

/// Build a fresh status snapshot.
///
/// One entry per configured queue, in configuration order. A queue with no
/// registered channel reports `consumed: false`. The snapshot only reads;
/// it never creates, opens, or mutates a channel.
#[must_use]
pub fn broker_status(context: &BrokerContext) -> BrokerStatus {
    let config = context.config();
    BrokerStatus {
        enabled: config.enabled,
        connected: context.is_connected(),
        service_uri: config.service_uri.clone(),
        user_name: config.user_name.clone(),
        queues: queue_states(config, context.directory()),
    }
}

/// Per-queue consumption states in configuration order.
#[must_use]
pub fn queue_states(config: &BrokerConfig, directory: &ChannelDirectory) -> Vec<QueueState> {
    config
        .queues
        .iter()
        .map(|queue| QueueState {
            name: queue.queue_name.clone(),
            app_id: queue.app_id.clone(),
            consumed: directory
                .lookup(&queue.queue_name)
                .is_some_and(|channel| channel.is_open()),
        })
        .collect()
}
