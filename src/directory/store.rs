//! Observable state container.
//!
//! A [`Store`] owns one value, hands out cloned snapshots and notifies
//! subscribers after every update. Listeners run outside the state lock, so
//! a listener may read the store it is subscribed to.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`Store::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Store<T> {
    state: RwLock<T>,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
}

impl<T: Clone> Store<T> {
    pub fn new(initial: T) -> Self {
        Self {
            state: RwLock::new(initial),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> T {
        self.state.read().clone()
    }

    /// Reads the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.read())
    }

    /// Mutates the state and notifies every subscriber with the result.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.write();
            let result = f(&mut state);
            (result, state.clone())
        };
        self.notify(&snapshot);
        result
    }

    /// Mutates the state only if `f` returns `Some`, notifying in that case.
    pub fn update_if<R>(&self, f: impl FnOnce(&mut T) -> Option<R>) -> Option<R> {
        let outcome = {
            let mut state = self.state.write();
            f(&mut state).map(|result| (result, state.clone()))
        };
        outcome.map(|(result, snapshot)| {
            self.notify(&snapshot);
            result
        })
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Removes a subscriber; returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn notify(&self, snapshot: &T) {
        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl<T: Clone + Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_every_update() {
        let store = Store::new(0usize);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |value| sink.lock().push(*value));

        store.update(|value| *value += 1);
        store.update(|value| *value += 2);

        assert_eq!(*seen.lock(), vec![1, 3]);
        assert_eq!(store.snapshot(), 3);
    }

    #[test]
    fn rejected_updates_do_not_notify() {
        let store = Store::new(1usize);
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let applied = store.update_if(|value| (*value > 5).then(|| *value = 0));

        assert!(applied.is_none());
        assert_eq!(store.snapshot(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let store = Store::new(String::new());
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let id = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.update(|value| value.push('x'));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_may_read_the_store() {
        let store = Arc::new(Store::new(0usize));
        let observed = Arc::new(Mutex::new(None));
        let (reader, sink) = (store.clone(), observed.clone());
        store.subscribe(move |_| *sink.lock() = Some(reader.snapshot()));

        store.update(|value| *value = 7);

        assert_eq!(*observed.lock(), Some(7));
    }
}
