//! Test observer that captures published states.

use portable_atomic_util::Arc;
use spin::Mutex;

use crate::{DomainStore, Observation, Store};

/// Test observer that captures every state a store delivers.
///
/// Only available with the `testing` feature.
///
/// Attaching registers a callback via [`Store::observe`], so the first
/// captured state is the one that was current at attach time, followed by
/// every publication in order.
///
/// # Example
///
/// ```rust
/// use oxide_store::{Store, TestObserver, Transition};
///
/// # struct Counter { value: i32 }
/// let store = Store::new(Counter { value: 0 });
/// let observer = TestObserver::attach(&store);
///
/// store.update([
///     Transition::map(|c: &Counter| Counter { value: c.value + 1 }),
///     Transition::map(|c: &Counter| Counter { value: c.value + 1 }),
/// ]);
///
/// assert_eq!(observer.count(), 2);
/// observer.with_states(|states| {
///     assert_eq!(states[0].value, 0);
///     assert_eq!(states[1].value, 2);
/// });
/// ```
pub struct TestObserver<T> {
    states: Arc<Mutex<Vec<Arc<T>>>>,
    _observation: Observation,
}

impl<T: Send + Sync + 'static> TestObserver<T> {
    /// Observe `store` and start capturing.
    pub fn attach(store: &Store<T>) -> Self {
        let states = Arc::new(Mutex::new(Vec::new()));
        let sink = states.clone();
        let observation = store.observe(move |state| {
            sink.lock().push(state.clone());
        });

        Self {
            states,
            _observation: observation,
        }
    }

    /// Observe the store wrapped by a [`DomainStore`].
    pub fn attach_domain<D>(domain: &D) -> Self
    where
        D: DomainStore<State = T>,
    {
        Self::attach(domain.store())
    }
}

impl<T> TestObserver<T> {
    /// Get the number of states captured so far, including the initial replay.
    pub fn count(&self) -> usize {
        self.states.lock().len()
    }

    /// The most recently captured state.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.states.lock().last().cloned()
    }

    /// Access the captured states with a closure.
    ///
    /// The closure receives every captured state, oldest first.
    pub fn with_states<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Vec<Arc<T>>) -> R,
    {
        let states = self.states.lock();
        f(&states)
    }
}
