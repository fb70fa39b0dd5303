//! A minimal state store for Model-View-Update style components.
//!
//! A [`Store`] owns one immutable state value. It exposes that value as a
//! synchronous snapshot and as a replay-latest stream, and changes it only by
//! folding batches of pure [`Transition`]s, publishing once per batch.
//!
//! Side effects stay outside the store: run them wherever you like, then hand
//! the resulting transitions to [`Store::update`].
//!
//! ## Example
//!
//! ```rust
//! use oxide_store::{DomainStore, Store, Transition};
//!
//! #[derive(Clone, Debug)]
//! struct Model { count: i32 }
//!
//! fn increment() -> Transition<Model> {
//!     Transition::map(|model: &Model| Model { count: model.count + 1 })
//! }
//!
//! fn multiply(factor: i32) -> Transition<Model> {
//!     Transition::map(move |model: &Model| Model { count: model.count * factor })
//! }
//!
//! struct CounterStore { store: Store<Model> }
//!
//! impl CounterStore {
//!     fn increment(&self) {
//!         self.store.update([increment()]);
//!     }
//!
//!     fn bump_and_double(&self) {
//!         // One publication for the whole batch.
//!         self.store.update([increment(), increment(), multiply(2)]);
//!     }
//! }
//!
//! impl DomainStore for CounterStore {
//!     type State = Model;
//!     fn store(&self) -> &Store<Model> { &self.store }
//! }
//!
//! let counter = CounterStore { store: Store::new(Model { count: 0 }) };
//! let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! let _observation = counter.observe(move |model| sink.lock().unwrap().push(model.count));
//!
//! counter.increment();
//! counter.bump_and_double();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![0, 1, 6]);
//! ```

// Module declarations
mod domain;
pub mod error;
mod store;
mod subscription;
mod transition;

#[cfg(any(test, feature = "testing"))]
mod observer;

// Public re-exports
pub use domain::DomainStore;
pub use error::StoreError;
pub use portable_atomic_util::Arc;
pub use store::Store;
pub use subscription::{Observation, Subscription};
pub use transition::Transition;

// Test utilities (only available with 'testing' feature or during tests)
#[cfg(any(test, feature = "testing"))]
pub use observer::TestObserver;
