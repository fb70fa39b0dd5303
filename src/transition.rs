//! Pure state transitions applied by a [`Store`](crate::Store).

use core::convert::Infallible;

use portable_atomic_util::Arc;

type TransitionFn<T, E> = Box<dyn FnOnce(Arc<T>) -> Result<Arc<T>, E> + 'static>;

/// A pure update function mapping one state to the next.
///
/// Transitions are handed to [`Store::update`](crate::Store::update) in
/// batches. The store folds them over its current state in order and publishes
/// the final result once, or not at all when the fold hands back the very same
/// [`Arc`] it started from.
///
/// The error parameter `E` is only used by [`Store::try_update`](crate::Store::try_update).
/// Infallible transitions use the default.
///
/// # Example
///
/// ```rust
/// use oxide_store::Transition;
///
/// #[derive(Clone)]
/// struct Counter { value: i32 }
///
/// fn increment() -> Transition<Counter> {
///     Transition::map(|counter: &Counter| Counter { value: counter.value + 1 })
/// }
///
/// fn multiply(factor: i32) -> Transition<Counter> {
///     Transition::map(move |counter: &Counter| Counter { value: counter.value * factor })
/// }
///
/// // Leaves the state untouched, so the store will not publish.
/// let noop: Transition<Counter> = Transition::identity();
///
/// let combined = Transition::batch(vec![increment(), multiply(2), noop]);
/// ```
pub struct Transition<T, E = Infallible>(TransitionFn<T, E>);

impl<T: 'static> Transition<T> {
    /// Create a transition from a function over the shared state.
    ///
    /// Returning the argument unchanged marks the transition as a no-op.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Arc<T>) -> Arc<T> + 'static,
    {
        Self(Box::new(move |state| Ok(f(state))))
    }

    /// Create a transition that builds a new state value from the current one.
    ///
    /// The result is always a fresh allocation and therefore always counts as
    /// a change, even when it is structurally equal to its input.
    pub fn map<F>(f: F) -> Self
    where
        F: FnOnce(&T) -> T + 'static,
    {
        Self::new(move |state| Arc::new(f(&state)))
    }

    /// Lift this transition into one that can sit in a fallible batch.
    pub fn into_fallible<E: 'static>(self) -> Transition<T, E> {
        Transition(Box::new(move |state| match self.apply(state) {
            Ok(next) => Ok(next),
            Err(never) => match never {},
        }))
    }
}

impl<T: 'static, E: 'static> Transition<T, E> {
    /// Create a transition that may reject the current state.
    ///
    /// # Example
    ///
    /// ```rust
    /// use oxide_store::{Arc, Transition};
    ///
    /// struct Account { balance: u32 }
    ///
    /// fn withdraw(amount: u32) -> Transition<Account, &'static str> {
    ///     Transition::fallible(move |account: Arc<Account>| {
    ///         account
    ///             .balance
    ///             .checked_sub(amount)
    ///             .map(|balance| Arc::new(Account { balance }))
    ///             .ok_or("insufficient funds")
    ///     })
    /// }
    /// ```
    pub fn fallible<F>(f: F) -> Self
    where
        F: FnOnce(Arc<T>) -> Result<Arc<T>, E> + 'static,
    {
        Self(Box::new(f))
    }

    /// A transition that hands back its input.
    pub fn identity() -> Self {
        Self(Box::new(Ok))
    }

    /// Combine several transitions into one, applied in order.
    ///
    /// Applying the batch stops at the first error.
    pub fn batch(transitions: Vec<Transition<T, E>>) -> Self {
        Self(Box::new(move |state| {
            transitions
                .into_iter()
                .try_fold(state, |state, transition| transition.apply(state))
        }))
    }

    /// Apply `next` after this transition.
    pub fn then(self, next: Transition<T, E>) -> Self {
        Self(Box::new(move |state| next.apply(self.apply(state)?)))
    }

    /// Run the update function against `state`.
    pub fn apply(self, state: Arc<T>) -> Result<Arc<T>, E> {
        (self.0)(state)
    }
}
