//! Composition seam for domain-specific stores.

use portable_atomic_util::Arc;

use crate::{Observation, Store, Subscription};

/// A store that exposes named domain operations around a private [`Store`].
///
/// Implementors own their `Store` and keep it private, so the only way to
/// change the state is through the implementor's own methods, each of which
/// calls [`Store::update`] with one or more transitions. Reading,
/// subscribing and observing are provided here.
///
/// # Example
///
/// ```rust
/// use oxide_store::{DomainStore, Store, Transition};
///
/// #[derive(Clone)]
/// struct Counter { value: i32 }
///
/// fn increment() -> Transition<Counter> {
///     Transition::map(|c: &Counter| Counter { value: c.value + 1 })
/// }
///
/// fn multiply(factor: i32) -> Transition<Counter> {
///     Transition::map(move |c: &Counter| Counter { value: c.value * factor })
/// }
///
/// struct CounterStore { store: Store<Counter> }
///
/// impl CounterStore {
///     fn new() -> Self {
///         Self { store: Store::new(Counter { value: 0 }) }
///     }
///
///     fn increment(&self) {
///         self.store.update([increment()]);
///     }
///
///     fn increment_then_double(&self) {
///         self.store.update([increment(), multiply(2)]);
///     }
/// }
///
/// impl DomainStore for CounterStore {
///     type State = Counter;
///
///     fn store(&self) -> &Store<Counter> {
///         &self.store
///     }
/// }
///
/// let counter = CounterStore::new();
/// counter.increment();
/// counter.increment_then_double();
/// assert_eq!(counter.state().value, 4);
/// ```
pub trait DomainStore {
    /// The state type held by the wrapped store.
    type State;

    /// The wrapped store.
    ///
    /// Keep the field itself private; this accessor is how the provided
    /// methods reach it.
    fn store(&self) -> &Store<Self::State>;

    /// The current state.
    fn state(&self) -> Arc<Self::State> {
        self.store().state()
    }

    /// Subscribe to the state stream.
    fn subscribe(&self) -> Subscription<Self::State> {
        self.store().subscribe()
    }

    /// Register a callback for the current and every later state.
    fn observe<F>(&self, callback: F) -> Observation
    where
        F: FnMut(&Arc<Self::State>) + Send + 'static,
    {
        self.store().observe(callback)
    }
}
