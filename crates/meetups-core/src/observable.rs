//! Observable values with push-based change notification.
//!
//! [`Writable<T>`] holds a value behind a lock and a registry of callbacks.
//! Every committed change swaps in a new immutable snapshot and invokes the
//! callbacks synchronously, in subscription order, with the lock released.
//!
//! Deliveries go through a per-value queue. A callback that commits again
//! while a fan-out is running only enqueues its deliveries; the outermost
//! commit drains the queue in order, so every subscriber sees every value
//! and sees them in commit order. With several writing threads, a commit
//! made while another thread is draining is delivered by that thread.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use meetups_core::observable::Writable;
//!
//! let counter = Writable::new(0);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let subscription = counter.subscribe(move |value| sink.lock().unwrap().push(*value));
//!
//! counter.set(1);
//! counter.update(|value| value + 1);
//! subscription.unsubscribe();
//! counter.set(10);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
//! ```

use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tracing::trace;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// One callback invocation waiting in the queue.
struct Delivery<T> {
    subscriber: u64,
    callback: Callback<T>,
    value: Arc<T>,
}

/// Shared state behind every handle of a [`Writable`].
struct State<T> {
    value: Arc<T>,
    version: u64,
    next_subscriber_id: u64,
    subscribers: Vec<(u64, Callback<T>)>,
    pending: VecDeque<Delivery<T>>,
    draining: bool,
}

impl<T> State<T> {
    /// Swaps in `value` and queues one delivery per subscriber.
    ///
    /// Returns true if the caller must drain the queue, false if a fan-out
    /// is already running and will pick the deliveries up.
    fn commit(&mut self, value: T) -> bool {
        self.value = Arc::new(value);
        self.version += 1;
        for (subscriber, callback) in &self.subscribers {
            self.pending.push_back(Delivery {
                subscriber: *subscriber,
                callback: Arc::clone(callback),
                value: Arc::clone(&self.value),
            });
        }
        trace!(
            version = self.version,
            queued = self.pending.len(),
            "Queued notifications"
        );
        !std::mem::replace(&mut self.draining, true)
    }

    /// Pops the next delivery whose subscriber is still registered.
    fn next_delivery(&mut self) -> Option<Delivery<T>> {
        while let Some(delivery) = self.pending.pop_front() {
            if self
                .subscribers
                .iter()
                .any(|(id, _)| *id == delivery.subscriber)
            {
                return Some(delivery);
            }
        }
        self.draining = false;
        None
    }
}

fn write_state<T>(state: &RwLock<State<T>>) -> RwLockWriteGuard<'_, State<T>> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

/// Resets the queue if a callback panics mid fan-out.
struct DrainGuard<'a, T> {
    state: &'a RwLock<State<T>>,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut state = write_state(self.state);
            state.pending.clear();
            state.draining = false;
        }
    }
}

/// An observable value.
///
/// Cloning a `Writable` yields another handle to the same value and the
/// same subscribers.
pub struct Writable<T> {
    state: Arc<RwLock<State<T>>>,
}

impl<T> Clone for Writable<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Default + Send + Sync + 'static> Default for Writable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Writable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Writable")
            .field("value", &state.value)
            .field("version", &state.version)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

impl<T> Writable<T> {
    // State is only written after user closures return, so a poisoned lock
    // still guards a consistent value.
    fn read(&self) -> RwLockReadGuard<'_, State<T>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State<T>> {
        write_state(&self.state)
    }
}

impl<T: Send + Sync + 'static> Writable<T> {
    /// Creates a new observable holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                value: Arc::new(value),
                version: 0,
                next_subscriber_id: 0,
                subscribers: Vec::new(),
                pending: VecDeque::new(),
                draining: false,
            })),
        }
    }

    /// Returns the current snapshot.
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.read().value)
    }

    /// Returns the number of committed changes so far.
    pub fn version(&self) -> u64 {
        self.read().version
    }

    /// Returns the number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.read().subscribers.len()
    }

    /// Replaces the value and notifies subscribers.
    pub fn set(&self, value: T) {
        let drain = self.write().commit(value);
        if drain {
            self.drain();
        }
    }

    /// Derives the next value from the current one and notifies subscribers.
    ///
    /// `f` runs under the write lock and must not touch this `Writable`.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let _ = self.try_update::<Infallible, _>(|current| Ok(Some(f(current))));
    }

    /// Like [`update`](Self::update), but `f` may decline to change anything
    /// by returning `None`. Returns true if a new value was committed.
    pub fn update_if<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> Option<T>,
    {
        matches!(
            self.try_update::<Infallible, _>(|current| Ok(f(current))),
            Ok(true)
        )
    }

    /// Fallible update.
    ///
    /// `Ok(Some(next))` commits and notifies, `Ok(None)` leaves the value
    /// alone, and `Err` is returned to the caller with nothing committed.
    pub fn try_update<E, F>(&self, f: F) -> Result<bool, E>
    where
        F: FnOnce(&T) -> Result<Option<T>, E>,
    {
        self.try_update_with(|current| {
            let next = f(current)?;
            let changed = next.is_some();
            Ok((next, changed))
        })
    }

    /// Fallible update that also hands an output back to the caller.
    ///
    /// `f` returns the next value (`None` to leave it alone) along with an
    /// output, returned once subscribers have been notified.
    pub fn try_update_with<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&T) -> Result<(Option<T>, R), E>,
    {
        let (drain, output) = {
            let mut state = self.write();
            let (next, output) = f(state.value.as_ref())?;
            let Some(next) = next else {
                return Ok(output);
            };
            (state.commit(next), output)
        };
        if drain {
            self.drain();
        }
        Ok(output)
    }

    /// Registers a callback.
    ///
    /// The callback runs once right away with the current value, then after
    /// every committed change until the returned [`Subscription`] is dropped
    /// or [`unsubscribed`](Subscription::unsubscribe).
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let callback: Callback<T> = Arc::new(callback);
        let (id, current) = {
            let mut state = self.write();
            let id = state.next_subscriber_id;
            state.next_subscriber_id += 1;
            state.subscribers.push((id, Arc::clone(&callback)));
            (id, Arc::clone(&state.value))
        };
        trace!(subscriber = id, "Subscribed");

        callback(current.as_ref());

        let state = Arc::downgrade(&self.state);
        Subscription {
            unsubscribe: Some(Box::new(move || remove_subscriber(&state, id))),
        }
    }

    /// Runs queued deliveries until the queue is empty.
    ///
    /// Commits made by the callbacks land at the back of the same queue.
    fn drain(&self) {
        let _guard = DrainGuard {
            state: self.state.as_ref(),
        };
        loop {
            let next = self.write().next_delivery();
            let Some(delivery) = next else {
                break;
            };
            (delivery.callback)(delivery.value.as_ref());
        }
        trace!("Notifications drained");
    }
}

fn remove_subscriber<T>(state: &Weak<RwLock<State<T>>>, id: u64) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = write_state(&state);
    state.subscribers.retain(|(subscriber, _)| *subscriber != id);
    trace!(subscriber = id, "Unsubscribed");
}

/// Handle to a registered callback.
///
/// Dropping the handle unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Removes the callback from its source.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
