//! The state container that owns, updates and publishes a state value.

use core::convert::Infallible;
use core::fmt;

use portable_atomic_util::Arc;
use spin::Mutex;
use tracing::{debug, trace};

use crate::subscription::{Listener, Slot};
use crate::{Observation, Subscription, Transition};

const DEFAULT_LABEL: &str = "store";

struct Shared<T> {
    current: Arc<T>,
    slots: Vec<Slot<T>>,
    listeners: Vec<Listener<T>>,
}

impl<T> Shared<T> {
    /// Forget subscriptions and observations that have been dropped.
    fn prune(&mut self, label: &'static str) {
        let before = self.subscriber_count();
        self.slots.retain(Slot::is_open);
        self.listeners.retain(Listener::is_alive);
        let pruned = before - self.subscriber_count();
        if pruned > 0 {
            debug!(store = label, pruned, "dropped closed subscriptions");
        }
    }

    fn subscriber_count(&self) -> usize {
        self.slots.len() + self.listeners.len()
    }
}

/// Holds one immutable state value and publishes every change to it.
///
/// A `Store`:
/// 1. Exposes the current state synchronously via [`Store::state`]
/// 2. Replays the current state, then every later one, to each callback
///    registered with [`Store::observe`]
/// 3. Keeps the newest unread state for each pull-style [`Subscription`]
/// 4. Folds batches of [`Transition`]s via [`Store::update`] and publishes the
///    final result at most once per call
///
/// A call publishes only when the folded state is a different allocation from
/// the state it started with. Structural equality is never consulted, so a
/// transition that rebuilds an equal value still counts as a change.
///
/// Domain stores wrap a `Store` privately and expose named operations; see
/// [`DomainStore`](crate::DomainStore).
///
/// For capturing publications in tests, use [`crate::TestObserver`].
///
/// # Reentrancy
///
/// Writers are serialized; a contended writer parks until the current one
/// finishes. Neither a transition nor an observer callback may call `update`
/// or `observe` on the same store: the nested call waits for the outer one and
/// never returns. Reading the state and calling `subscribe` are fine.
pub struct Store<T> {
    label: &'static str,
    writer: parking_lot::Mutex<()>,
    shared: Mutex<Shared<T>>,
}

impl<T> Store<T> {
    /// Create a store seeded with `initial`.
    pub fn new(initial: T) -> Self {
        Self::from_arc(Arc::new(initial))
    }

    /// Create a store seeded with an already shared state value.
    pub fn from_arc(initial: Arc<T>) -> Self {
        Self::labeled_arc(DEFAULT_LABEL, initial)
    }

    /// Create a store whose log events carry `label`.
    pub fn labeled(label: &'static str, initial: T) -> Self {
        Self::labeled_arc(label, Arc::new(initial))
    }

    fn labeled_arc(label: &'static str, initial: Arc<T>) -> Self {
        debug!(store = label, "store created");
        Store {
            label,
            writer: parking_lot::Mutex::new(()),
            shared: Mutex::new(Shared {
                current: initial,
                slots: Vec::new(),
                listeners: Vec::new(),
            }),
        }
    }

    /// The label this store logs under.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The current state.
    pub fn state(&self) -> Arc<T> {
        self.shared.lock().current.clone()
    }

    /// Subscribe to the state stream.
    ///
    /// The returned subscription already holds the current state as its first
    /// value. Later publications replace whatever it has not read yet.
    pub fn subscribe(&self) -> Subscription<T> {
        let mut shared = self.shared.lock();
        let (slot, subscription) = Slot::open(shared.current.clone());
        shared.slots.push(slot);
        trace!(
            store = self.label,
            subscribers = shared.subscriber_count(),
            "subscription added"
        );

        subscription
    }

    /// Register a callback that receives the current state immediately and
    /// then every published state, in order.
    ///
    /// Callbacks run synchronously inside [`Store::update`], in registration
    /// order, after the new state is committed, so [`Store::state`] already
    /// returns the published value. Every callback receives the same
    /// allocation for a given publication.
    ///
    /// Dropping the returned [`Observation`] unregisters the callback.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::{Arc, Mutex};
    /// use oxide_store::{Store, Transition};
    ///
    /// struct Counter { value: i32 }
    ///
    /// let store = Store::new(Counter { value: 0 });
    /// let seen = Arc::new(Mutex::new(Vec::new()));
    /// let sink = seen.clone();
    /// let _observation = store.observe(move |c| sink.lock().unwrap().push(c.value));
    ///
    /// store.update([Transition::map(|c: &Counter| Counter { value: c.value + 1 })]);
    /// store.update([Transition::map(|c: &Counter| Counter { value: c.value * 5 })]);
    ///
    /// assert_eq!(*seen.lock().unwrap(), vec![0, 1, 5]);
    /// ```
    pub fn observe<F>(&self, callback: F) -> Observation
    where
        F: FnMut(&Arc<T>) + Send + 'static,
    {
        // Held so no publication reaches the callback before its replay.
        let _writer = self.writer.lock();

        let (listener, observation) = Listener::register(callback);
        let current = {
            let mut shared = self.shared.lock();
            shared.listeners.push(listener.clone());
            trace!(
                store = self.label,
                subscribers = shared.subscriber_count(),
                "observer added"
            );
            shared.current.clone()
        };
        listener.notify(&current);

        observation
    }

    /// Number of live subscriptions and observations.
    pub fn subscriber_count(&self) -> usize {
        let mut shared = self.shared.lock();
        shared.prune(self.label);
        shared.subscriber_count()
    }

    /// Apply a batch of transitions and publish the result once.
    ///
    /// The transitions are folded over the current state in order. If the
    /// final state is the same allocation as the starting one, nothing is
    /// published; otherwise it replaces the current state and is delivered to
    /// every subscriber. Intermediate states are never visible.
    ///
    /// Returns whether a new state was published. An empty batch never
    /// publishes.
    ///
    /// If a transition panics, the panic propagates and the store keeps its
    /// previous state.
    ///
    /// # Example
    ///
    /// ```rust
    /// use oxide_store::{Store, Transition};
    ///
    /// struct Counter { value: i32 }
    ///
    /// fn increment() -> Transition<Counter> {
    ///     Transition::map(|c: &Counter| Counter { value: c.value + 1 })
    /// }
    ///
    /// let store = Store::new(Counter { value: 0 });
    /// let mut published = 0;
    ///
    /// if store.update([increment(), increment(), increment()]) {
    ///     published += 1;
    /// }
    ///
    /// assert_eq!(store.state().value, 3);
    /// assert_eq!(published, 1);
    /// ```
    pub fn update<I>(&self, transitions: I) -> bool
    where
        T: 'static,
        I: IntoIterator<Item = Transition<T>>,
    {
        match self.try_update::<Infallible, I>(transitions) {
            Ok(published) => published,
            Err(never) => match never {},
        }
    }

    /// Apply a single update function.
    pub fn update_with<F>(&self, f: F) -> bool
    where
        T: 'static,
        F: FnOnce(Arc<T>) -> Arc<T> + 'static,
    {
        self.update([Transition::new(f)])
    }

    /// Apply a batch of fallible transitions.
    ///
    /// Behaves like [`Store::update`], except that the first transition to
    /// return `Err` aborts the batch. The error is handed back to the caller,
    /// the remaining transitions are not run, the state is left unchanged and
    /// nothing is published.
    pub fn try_update<E, I>(&self, transitions: I) -> Result<bool, E>
    where
        T: 'static,
        E: 'static,
        I: IntoIterator<Item = Transition<T, E>>,
    {
        let _writer = self.writer.lock();

        let original = self.state();
        let next = transitions
            .into_iter()
            .try_fold(original.clone(), |state, transition| transition.apply(state))
            .inspect_err(|_| trace!(store = self.label, "update rejected, state kept"))?;

        if Arc::ptr_eq(&original, &next) {
            trace!(store = self.label, "update produced no change");
            return Ok(false);
        }

        self.publish(next);
        Ok(true)
    }

    fn publish(&self, next: Arc<T>) {
        let listeners = {
            let mut shared = self.shared.lock();
            shared.current = next.clone();
            shared.prune(self.label);
            for slot in &shared.slots {
                slot.offer(next.clone());
            }
            trace!(
                store = self.label,
                subscribers = shared.subscriber_count(),
                "state published"
            );
            shared.listeners.clone()
        };

        for listener in &listeners {
            listener.notify(&next);
        }
    }
}

impl<T: Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Store<T> {
    fn from(initial: T) -> Self {
        Self::new(initial)
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("Store")
            .field("label", &self.label)
            .field("state", &*shared.current)
            .field("subscribers", &shared.subscriber_count())
            .finish()
    }
}
