//! Publish/subscribe channel for hook execution and reload notifications

use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscribers<T> {
    next_id: u64,
    list: Vec<(u64, Callback<T>)>,
}

/// Ordered, removable subscriber list.
///
/// `publish` dispatches to a snapshot of the list taken before the first
/// callback runs and never holds the lock while calling out. Subscribing or
/// unsubscribing from inside a callback therefore takes effect on the next
/// publish.
pub struct EventBus<T> {
    subscribers: Arc<Mutex<Subscribers<T>>>,
}

impl<T: 'static> EventBus<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Subscribers {
                next_id: 0,
                list: Vec::new(),
            })),
        }
    }

    /// Add a subscriber at the end of the dispatch order
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut subs = self.lock();
            let id = subs.next_id;
            subs.next_id += 1;
            subs.list.push((id, Arc::new(callback)));
            id
        };

        let weak: Weak<Mutex<Subscribers<T>>> = Arc::downgrade(&self.subscribers);
        Subscription {
            remove: Mutex::new(Some(Box::new(move || {
                if let Some(subs) = weak.upgrade() {
                    subs.lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .list
                        .retain(|(sub_id, _)| *sub_id != id);
                }
            }))),
        }
    }

    /// Deliver `event` to every current subscriber, in subscription order
    pub fn publish(&self, event: &T) {
        let snapshot: Vec<Callback<T>> = {
            let subs = self.lock();
            if subs.list.is_empty() {
                return;
            }
            subs.list.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for callback in snapshot {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().list.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Subscribers<T>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[must_use = "dropping the subscription keeps the callback subscribed; call unsubscribe() to remove it"]
pub struct Subscription {
    remove: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    /// Remove the subscriber. Calling it again does nothing.
    pub fn unsubscribe(&self) {
        let remove = self
            .remove
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(remove) = remove {
            remove();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
