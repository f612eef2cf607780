// SPDX-FileCopyrightText: 2026 Beacon Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Channel event observers.
//!
//! Observers are registered from arbitrary caller contexts, so the list is
//! lock-guarded; dispatch snapshots the list and invokes callbacks outside
//! the lock, preserving registration order per observer.

use std::sync::{Arc, RwLock};

/// Receives channel lifecycle callbacks.
pub trait ChannelObserver: Send + Sync {
    /// Called once a channel has been created.
    fn on_channel_created(&self, channel_id: &str);

    /// Called after a successful registration update.
    fn on_channel_updated(&self, channel_id: &str);
}

/// Optional system-wide broadcast hook, invoked when a channel identifier
/// becomes available and extended broadcasts are enabled.
pub trait IdentifierBroadcast: Send + Sync {
    fn channel_created(&self, channel_id: &str);
}

/// Thread-safe fan-out to registered observers.
#[derive(Default)]
pub struct EventDispatcher {
    observers: RwLock<Vec<Arc<dyn ChannelObserver>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer. Observers are notified in registration order.
    pub fn add_observer(&self, observer: Arc<dyn ChannelObserver>) {
        self.observers
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(observer);
    }

    /// Returns the number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Notifies all observers of channel creation.
    pub fn notify_created(&self, channel_id: &str) {
        for observer in self.snapshot() {
            observer.on_channel_created(channel_id);
        }
    }

    /// Notifies all observers of a registration update.
    pub fn notify_updated(&self, channel_id: &str) {
        for observer in self.snapshot() {
            observer.on_channel_updated(channel_id);
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn ChannelObserver>> {
        self.observers
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        created: AtomicUsize,
        updated: AtomicUsize,
    }

    impl ChannelObserver for Counter {
        fn on_channel_created(&self, _channel_id: &str) {
            self.created.fetch_add(1, Ordering::SeqCst);
        }

        fn on_channel_updated(&self, _channel_id: &str) {
            self.updated.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_dispatch_reaches_all_observers() {
        let dispatcher = EventDispatcher::new();
        let a = Arc::new(Counter {
            created: AtomicUsize::new(0),
            updated: AtomicUsize::new(0),
        });
        let b = Arc::new(Counter {
            created: AtomicUsize::new(0),
            updated: AtomicUsize::new(0),
        });

        dispatcher.add_observer(a.clone());
        dispatcher.add_observer(b.clone());
        assert_eq!(dispatcher.observer_count(), 2);

        dispatcher.notify_created("channel-1");
        dispatcher.notify_updated("channel-1");
        dispatcher.notify_updated("channel-1");

        assert_eq!(a.created.load(Ordering::SeqCst), 1);
        assert_eq!(a.updated.load(Ordering::SeqCst), 2);
        assert_eq!(b.created.load(Ordering::SeqCst), 1);
        assert_eq!(b.updated.load(Ordering::SeqCst), 2);
    }
}
