//! Shared broker context: configuration, channel directory, connection flag.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{info, warn};

use {
    warren_channels::{BrokerConnection, ChannelDirectory, ConsumeChannel},
    warren_config::BrokerConfig,
};

/// Context object shared by everything that needs channel lookup.
///
/// Built once at service start and passed by reference; there is no global
/// registry. One [`ConsumeChannel`] per configured queue is created up
/// front and lives for the process.
pub struct BrokerContext {
    config: BrokerConfig,
    directory: Arc<ChannelDirectory>,
    connected: AtomicBool,
}

impl BrokerContext {
    /// Build the context and its channel directory from configuration.
    #[must_use]
    pub fn new(config: BrokerConfig) -> Self {
        let directory = Arc::new(ChannelDirectory::new());
        for queue in &config.queues {
            directory.insert(ConsumeChannel::new(
                queue.queue_name.clone(),
                queue.app_id.clone(),
            ));
        }
        Self {
            config,
            directory,
            connected: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    #[must_use]
    pub fn directory(&self) -> &Arc<ChannelDirectory> {
        &self.directory
    }

    /// Whether the broker connection is currently established. Distinct
    /// from any per-channel state.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Open every configured channel on a freshly established connection.
    ///
    /// A failure on one queue is logged and does not stop the remaining
    /// queues.
    pub async fn on_connection_established(&self, connection: &dyn BrokerConnection) {
        for queue in &self.config.queues {
            let Some(channel) = self.directory.lookup(&queue.queue_name) else {
                continue;
            };
            if let Err(e) = channel.open(connection).await {
                warn!(queue = %queue.queue_name, error = %e, "failed to open consume channel");
            }
        }
        self.connected.store(true, Ordering::SeqCst);
        info!(queues = self.config.queues.len(), "broker connection established");
    }

    /// Record that the broker connection was lost.
    ///
    /// Channel finalization arrives through each channel's own shutdown
    /// callback; only the connection flag changes here.
    pub fn on_connection_lost(&self) {
        self.connected.store(false, Ordering::SeqCst);
        info!("broker connection lost");
    }

    /// Close every open channel and drop the connection flag. Teardown for
    /// service stop.
    pub async fn shutdown(&self) {
        for channel in self.directory.channels() {
            if !channel.is_open() {
                continue;
            }
            if let Err(e) = channel.close().await {
                warn!(queue = %channel.queue_name(), error = %e, "failed to close consume channel");
            }
        }
        self.connected.store(false, Ordering::SeqCst);
        info!("broker context shut down");
    }
}
