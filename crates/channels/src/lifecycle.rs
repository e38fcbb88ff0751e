//! Consume-channel lifecycle state machine.

use std::{
    fmt,
    sync::{Arc, Mutex, Weak},
};

use tracing::{debug, warn};

use crate::{
    Error, Result,
    broker::{BrokerChannel, BrokerConnection, BrokerError, ShutdownSignal},
    listener::{ChannelEvent, ChannelListener, ListenerSet},
    state::ChannelState,
};

/// One broker channel consuming from one queue.
///
/// Owns the broker-side channel handle and enforces the
/// `Disconnected → Connected → ClosePending → Disconnected` lifecycle.
/// Callers drive [`open`](Self::open) and [`close`](Self::close); the
/// broker client fires the shutdown callback asynchronously on its own
/// dispatch thread, and that callback is the single authoritative finalizer
/// for every closure path. Every transition is funneled through one
/// internal lock, which is never held across an await point or a listener
/// fan-out.
pub struct ConsumeChannel {
    queue_name: String,
    app_id: String,
    inner: Mutex<Inner>,
    listeners: ListenerSet,
    self_weak: Weak<ConsumeChannel>,
}

struct Inner {
    state: ChannelState,
    handle: Option<Arc<dyn BrokerChannel>>,
}

impl ConsumeChannel {
    /// Create a channel for `queue_name` in the `Disconnected` state.
    pub fn new(queue_name: impl Into<String>, app_id: impl Into<String>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            queue_name: queue_name.into(),
            app_id: app_id.into(),
            inner: Mutex::new(Inner {
                state: ChannelState::Disconnected,
                handle: None,
            }),
            listeners: ListenerSet::new(),
            self_weak: weak.clone(),
        })
    }

    /// Queue this channel consumes from.
    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Application id tag from configuration.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.inner.lock().unwrap().state
    }

    /// Whether the channel is open and consuming. True iff the state is
    /// `Connected`; this is the authoritative status predicate.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Connected
    }

    /// The broker client's own view of the handle.
    ///
    /// May disagree with [`is_open`](Self::is_open) between a broker-side
    /// close and delivery of the shutdown callback. Diagnostic only.
    #[must_use]
    pub fn handle_is_open(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.handle.as_ref().is_some_and(|handle| handle.is_open())
    }

    /// Broker channel number of the current handle, for diagnostics.
    #[must_use]
    pub fn channel_number(&self) -> Option<u16> {
        let inner = self.inner.lock().unwrap();
        inner.handle.as_ref().map(|handle| handle.channel_number())
    }

    /// Register a lifecycle listener. Idempotent.
    pub fn add_listener(&self, listener: Arc<dyn ChannelListener>) {
        self.listeners.add(listener);
    }

    /// Deregister a lifecycle listener. Idempotent.
    pub fn remove_listener(&self, listener: &Arc<dyn ChannelListener>) {
        self.listeners.remove(listener);
    }

    /// Open a channel on `connection` and start the lifecycle.
    ///
    /// Only valid from `Disconnected`; any other state logs a warning and
    /// returns without touching state or emitting events. On success the
    /// shutdown callback is registered on the new handle and an
    /// [`ChannelEvent::Open`] fan-out fires. A handshake failure is
    /// propagated as [`Error::Create`] and the state stays `Disconnected`.
    ///
    /// The broker client may report success without producing a handle; the
    /// channel still advances to `Connected` in that case, with no handle
    /// and no `Open` event.
    pub async fn open(&self, connection: &dyn BrokerConnection) -> Result<()> {
        {
            let inner = self.inner.lock().unwrap();
            if inner.state != ChannelState::Disconnected {
                warn!(
                    queue = %self.queue_name,
                    state = inner.state.as_str(),
                    "channel is already open or close is pending"
                );
                return Ok(());
            }
        }

        let handle = connection.create_channel().await.map_err(|source| Error::Create {
            queue: self.queue_name.clone(),
            source,
        })?;

        let opened = {
            let mut inner = self.inner.lock().unwrap();
            if inner.state != ChannelState::Disconnected {
                // A concurrent open finished first while the handshake was
                // in flight; drop the extra handle.
                warn!(
                    queue = %self.queue_name,
                    state = inner.state.as_str(),
                    "discarding channel from a superseded open"
                );
                return Ok(());
            }
            match handle {
                Some(handle) => {
                    let weak = self.self_weak.clone();
                    handle.register_shutdown_callback(Box::new(move |signal| {
                        if let Some(channel) = weak.upgrade() {
                            channel.shutdown_completed(signal);
                        }
                    }));
                    inner.handle = Some(handle);
                    inner.state = ChannelState::Connected;
                    true
                },
                None => {
                    warn!(queue = %self.queue_name, "broker returned no channel handle");
                    inner.state = ChannelState::Connected;
                    false
                },
            }
        };

        if opened {
            debug!(queue = %self.queue_name, app_id = %self.app_id, "channel opened");
            self.listeners.notify(ChannelEvent::Open, self);
        }
        Ok(())
    }

    /// Request a broker-side close.
    ///
    /// Only valid from `Connected`; any other state logs a warning and
    /// returns without touching state or emitting events. A successful
    /// request leaves the channel in `ClosePending` — the broker confirms
    /// through the shutdown callback, which performs the finalization. A
    /// failing request is propagated as [`Error::Close`]: when the failure
    /// itself carries a shutdown signal the channel stays `ClosePending`
    /// and the callback finalizes later; any other I/O failure finalizes
    /// immediately, emitting [`ChannelEvent::CloseCompleted`].
    pub async fn close(&self) -> Result<()> {
        let handle = {
            let mut inner = self.inner.lock().unwrap();
            if inner.state != ChannelState::Connected {
                warn!(
                    queue = %self.queue_name,
                    state = inner.state.as_str(),
                    "channel is already closed or close is pending"
                );
                return Ok(());
            }
            let Some(handle) = inner.handle.clone() else {
                warn!(queue = %self.queue_name, "no broker handle to close");
                return Ok(());
            };
            inner.state = ChannelState::ClosePending;
            handle
        };

        match handle.close().await {
            // The broker confirms through the shutdown callback; nothing to
            // finalize here.
            Ok(()) => Ok(()),
            Err(source @ BrokerError::Shutdown(_)) => {
                // The close failed because the broker is already tearing
                // the channel down; the shutdown callback finalizes.
                warn!(queue = %self.queue_name, error = %source, "close failed during broker shutdown");
                Err(Error::Close {
                    queue: self.queue_name.clone(),
                    source,
                })
            },
            Err(source) => {
                warn!(queue = %self.queue_name, error = %source, "failed to close channel");
                let finalize = {
                    let mut inner = self.inner.lock().unwrap();
                    if inner.state == ChannelState::ClosePending {
                        inner.state = ChannelState::Disconnected;
                        inner.handle = None;
                        true
                    } else {
                        // The shutdown callback overtook this failure and
                        // already finalized the channel.
                        false
                    }
                };
                if finalize {
                    self.listeners.notify(ChannelEvent::CloseCompleted, self);
                }
                Err(Error::Close {
                    queue: self.queue_name.clone(),
                    source,
                })
            },
        }
    }

    /// Finalize the lifecycle after the broker reports the channel gone.
    ///
    /// Invoked from the callback registered on the handle during `open`,
    /// on the broker client's dispatch thread. Idempotent: a signal
    /// arriving after the channel was already finalized changes nothing and
    /// emits no second event.
    fn shutdown_completed(&self, signal: ShutdownSignal) {
        if !signal.initiated_by_application {
            warn!(
                queue = %self.queue_name,
                channel = ?self.channel_number(),
                reason = %signal.reason,
                "broker channel was closed unexpectedly"
            );
        }

        let finalize = {
            let mut inner = self.inner.lock().unwrap();
            if inner.state == ChannelState::Disconnected {
                debug!(queue = %self.queue_name, "shutdown signal for an already finalized channel");
                false
            } else {
                inner.state = ChannelState::Disconnected;
                inner.handle = None;
                true
            }
        };
        if finalize {
            debug!(queue = %self.queue_name, "channel close completed");
            self.listeners.notify(ChannelEvent::CloseCompleted, self);
        }
    }
}

impl fmt::Debug for ConsumeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("ConsumeChannel")
            .field("queue_name", &self.queue_name)
            .field("app_id", &self.app_id)
            .field("state", &inner.state)
            .finish_non_exhaustive()
    }
}
