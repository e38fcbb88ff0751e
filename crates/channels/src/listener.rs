//! Channel lifecycle listeners and their registry.

use std::sync::{Arc, RwLock};

use crate::lifecycle::ConsumeChannel;

/// A lifecycle event emitted by a consume channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel was opened.
    Open,
    /// The channel finished closing, gracefully or not.
    CloseCompleted,
}

/// Observer of a channel's open/close lifecycle.
///
/// A listener may be attached to any number of channels, and a channel may
/// carry any number of listeners. Identity is the `Arc` pointer, so the
/// same allocation added twice is registered once.
pub trait ChannelListener: Send + Sync {
    /// The channel was opened.
    fn on_open(&self, channel: &ConsumeChannel);

    /// The channel finished closing.
    fn on_close_completed(&self, channel: &ConsumeChannel);
}

/// Set of listeners with snapshot fan-out.
///
/// `notify` copies the current listener list under a briefly-held lock and
/// dispatches on the copy, so concurrent `add`/`remove` never observe a
/// broken iteration. Listeners added after a fan-out begins do not receive
/// the in-flight event; listeners removed after it begins may still receive
/// it. Dispatch order across listeners is unspecified.
#[derive(Default)]
pub struct ListenerSet {
    listeners: RwLock<Vec<Arc<dyn ChannelListener>>>,
}

impl ListenerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Adding one that is already present is a no-op.
    pub fn add(&self, listener: Arc<dyn ChannelListener>) {
        let mut listeners = self.listeners.write().unwrap();
        if listeners.iter().any(|known| Arc::ptr_eq(known, &listener)) {
            return;
        }
        listeners.push(listener);
    }

    /// Deregister a listener. Removing one that is absent is a no-op.
    pub fn remove(&self, listener: &Arc<dyn ChannelListener>) {
        self.listeners
            .write()
            .unwrap()
            .retain(|known| !Arc::ptr_eq(known, listener));
    }

    /// Synchronously deliver `event` to every currently registered listener.
    pub fn notify(&self, event: ChannelEvent, channel: &ConsumeChannel) {
        let snapshot: Vec<Arc<dyn ChannelListener>> = self.listeners.read().unwrap().clone();
        for listener in snapshot {
            match event {
                ChannelEvent::Open => listener.on_open(channel),
                ChannelEvent::CloseCompleted => listener.on_close_completed(channel),
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ChannelListener for Recorder {
        fn on_open(&self, _channel: &ConsumeChannel) {
            self.log.lock().unwrap().push(self.label);
        }

        fn on_close_completed(&self, _channel: &ConsumeChannel) {
            self.log.lock().unwrap().push(self.label);
        }
    }

    struct RemoveOnOpen {
        set: Arc<ListenerSet>,
        target: Arc<dyn ChannelListener>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ChannelListener for RemoveOnOpen {
        fn on_open(&self, _channel: &ConsumeChannel) {
            self.log.lock().unwrap().push("remover");
            self.set.remove(&self.target);
        }

        fn on_close_completed(&self, _channel: &ConsumeChannel) {}
    }

    struct AddOnOpen {
        set: Arc<ListenerSet>,
        extra: Mutex<Option<Arc<dyn ChannelListener>>>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ChannelListener for AddOnOpen {
        fn on_open(&self, _channel: &ConsumeChannel) {
            self.log.lock().unwrap().push("adder");
            if let Some(extra) = self.extra.lock().unwrap().take() {
                self.set.add(extra);
            }
        }

        fn on_close_completed(&self, _channel: &ConsumeChannel) {}
    }

    fn test_channel() -> Arc<ConsumeChannel> {
        ConsumeChannel::new("orders", "svc1")
    }

    #[test]
    fn adding_the_same_listener_twice_registers_it_once() {
        let channel = test_channel();
        let set = ListenerSet::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let listener: Arc<dyn ChannelListener> = Arc::new(Recorder { label: "a", log: Arc::clone(&log) });

        set.add(Arc::clone(&listener));
        set.add(Arc::clone(&listener));
        assert_eq!(set.len(), 1);

        set.notify(ChannelEvent::Open, &channel);
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let set = ListenerSet::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let listener: Arc<dyn ChannelListener> = Arc::new(Recorder { label: "a", log });

        set.add(Arc::clone(&listener));
        set.remove(&listener);
        set.remove(&listener);
        assert!(set.is_empty());
    }

    #[test]
    fn removal_during_fanout_still_delivers_the_snapshot() {
        let channel = test_channel();
        let set = Arc::new(ListenerSet::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let target: Arc<dyn ChannelListener> = Arc::new(Recorder { label: "target", log: Arc::clone(&log) });
        let remover: Arc<dyn ChannelListener> = Arc::new(RemoveOnOpen {
            set: Arc::clone(&set),
            target: Arc::clone(&target),
            log: Arc::clone(&log),
        });

        set.add(remover);
        set.add(Arc::clone(&target));

        // The removed listener was part of the snapshot and still receives
        // the in-flight event in full.
        set.notify(ChannelEvent::Open, &channel);
        assert_eq!(*log.lock().unwrap(), vec!["remover", "target"]);

        log.lock().unwrap().clear();
        set.notify(ChannelEvent::Open, &channel);
        assert_eq!(*log.lock().unwrap(), vec!["remover"]);
    }

    #[test]
    fn listener_added_during_fanout_misses_the_inflight_event() {
        let channel = test_channel();
        let set = Arc::new(ListenerSet::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let late: Arc<dyn ChannelListener> = Arc::new(Recorder { label: "late", log: Arc::clone(&log) });
        let adder: Arc<dyn ChannelListener> = Arc::new(AddOnOpen {
            set: Arc::clone(&set),
            extra: Mutex::new(Some(late)),
            log: Arc::clone(&log),
        });

        set.add(adder);

        set.notify(ChannelEvent::Open, &channel);
        assert_eq!(*log.lock().unwrap(), vec!["adder"]);

        log.lock().unwrap().clear();
        set.notify(ChannelEvent::Open, &channel);
        assert_eq!(*log.lock().unwrap(), vec!["adder", "late"]);
    }
}
