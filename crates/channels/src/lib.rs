//! Broker consume-channel supervision.
//!
//! Each configured queue gets one [`ConsumeChannel`]: a lifecycle state
//! machine owning the broker-side channel handle, reconciling caller-driven
//! open/close requests with shutdown signals the broker client delivers
//! asynchronously. Lifecycle listeners observe open/close events through a
//! snapshot-consistent registry, and a [`ChannelDirectory`] maps queue
//! names to their live channels. The broker client itself is a collaborator
//! consumed through the traits in [`broker`].

pub mod broker;
pub mod directory;
pub mod lifecycle;
pub mod listener;
pub mod state;

pub use broker::{BrokerChannel, BrokerConnection, BrokerError, ShutdownCallback, ShutdownSignal};
pub use directory::ChannelDirectory;
pub use lifecycle::ConsumeChannel;
pub use listener::{ChannelEvent, ChannelListener, ListenerSet};
pub use state::ChannelState;

/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors surfaced by channel lifecycle operations.
///
/// Only the synchronous open/close paths surface errors to callers.
/// Broker-driven asynchronous failures are absorbed into state and listener
/// notification and never raised here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Creating a channel on the broker connection failed.
    #[error("failed to open channel for queue {queue}: {source}")]
    Create {
        queue: String,
        #[source]
        source: BrokerError,
    },

    /// Closing the broker-side channel failed.
    #[error("failed to close channel for queue {queue}: {source}")]
    Close {
        queue: String,
        #[source]
        source: BrokerError,
    },
}

impl Error {
    /// The underlying broker client failure.
    #[must_use]
    pub fn broker_error(&self) -> &BrokerError {
        match self {
            Self::Create { source, .. } | Self::Close { source, .. } => source,
        }
    }

    /// Queue the failing channel consumes from.
    #[must_use]
    pub fn queue(&self) -> &str {
        match self {
            Self::Create { queue, .. } | Self::Close { queue, .. } => queue,
        }
    }
}
