//! Broker client collaborator contracts.
//!
//! Connection establishment, retry/backoff, and message delivery belong to
//! the broker client; this crate only consumes the contracts below.

use std::{fmt, sync::Arc};

use async_trait::async_trait;

/// Callback invoked by the broker client when a channel shuts down.
///
/// Runs on the client's own dispatch thread and must not block beyond state
/// mutation and listener fan-out.
pub type ShutdownCallback = Box<dyn Fn(ShutdownSignal) + Send + Sync>;

/// Broker-originated notification that a channel has been closed.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    /// True when the closure was requested by this application, false when
    /// the broker or the network forced it.
    pub initiated_by_application: bool,
    /// Broker-supplied reply text or local diagnostic.
    pub reason: String,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.initiated_by_application {
            write!(f, "{} (application initiated)", self.reason)
        } else {
            write!(f, "{}", self.reason)
        }
    }
}

/// Failure reported by the broker client.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// An I/O failure on the wire.
    #[error("broker i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// The operation failed because the channel is already shutting down.
    #[error("channel is shutting down: {0}")]
    Shutdown(ShutdownSignal),
}

/// An established connection to the broker, able to multiplex channels.
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    /// Create a new channel on this connection.
    ///
    /// Blocks on the broker handshake, bounded by the client's own timeout
    /// policy. `Ok(None)` means the client reported success without
    /// producing a handle.
    async fn create_channel(&self) -> Result<Option<Arc<dyn BrokerChannel>>, BrokerError>;
}

/// A broker-side channel handle.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Request a broker-side close and wait for the acknowledgment.
    async fn close(&self) -> Result<(), BrokerError>;

    /// The client's own view of whether the channel is open.
    ///
    /// May disagree with [`ConsumeChannel::is_open`] in the window between
    /// a broker-side close and delivery of the shutdown callback; callers
    /// needing authoritative status use the lifecycle state instead.
    ///
    /// [`ConsumeChannel::is_open`]: crate::lifecycle::ConsumeChannel::is_open
    fn is_open(&self) -> bool;

    /// Channel number, for diagnostics.
    fn channel_number(&self) -> u16;

    /// Register the callback fired when this channel shuts down.
    fn register_shutdown_callback(&self, callback: ShutdownCallback);
}
