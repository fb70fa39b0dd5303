//! Subscriber handles for a store's state stream.

use flume::{Receiver, Sender};
use parking_lot::Mutex;
use portable_atomic_util::{Arc, Weak};

use crate::error::Result;

/// Pull-style view of a [`Store`](crate::Store)'s state stream.
///
/// The first value is the state that was current when
/// [`Store::subscribe`](crate::Store::subscribe) returned. After that, each
/// read yields the newest state published since the previous read. The
/// subscription holds at most one unread state: a publication replaces any
/// state that has not been read yet, so a rarely read subscription never pins
/// old states. Use [`Store::observe`](crate::Store::observe) to see every
/// state.
///
/// Dropping the subscription unsubscribes it. Other subscribers are not
/// affected.
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
/// let subscription = store.subscribe();
/// assert_eq!(subscription.latest().map(|c| c.value), Some(0));
///
/// store.update([increment()]);
/// store.update([increment()]);
///
/// // Only the newest unread state is kept.
/// assert_eq!(subscription.latest().map(|c| c.value), Some(2));
/// assert!(subscription.latest().is_none());
/// ```
pub struct Subscription<T>(pub(crate) Receiver<Arc<T>>);

impl<T> Subscription<T> {
    /// Take the newest unread state without waiting.
    ///
    /// Returns [`StoreError::Empty`](crate::StoreError::Empty) when nothing
    /// new was published, and [`StoreError::Closed`](crate::StoreError::Closed)
    /// once the store is gone and the last state has been read.
    pub fn try_next(&self) -> Result<Arc<T>> {
        Ok(self.0.try_recv()?)
    }

    /// Wait for the next state.
    ///
    /// Publications only happen inside [`Store::update`](crate::Store::update),
    /// so this is only useful when another thread owns the writes.
    pub fn next_blocking(&self) -> Result<Arc<T>> {
        Ok(self.0.recv()?)
    }

    /// The newest unread state, if any.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.0.try_recv().ok()
    }

    /// Convert into an async stream of states.
    ///
    /// Each item is the newest state published since the previous one was
    /// polled. The stream ends once the store is dropped and the last state
    /// has been yielded.
    pub fn into_stream(self) -> flume::r#async::RecvStream<'static, Arc<T>> {
        self.0.into_stream()
    }
}

/// Store-side end of a [`Subscription`]: a one-state slot.
pub(crate) struct Slot<T> {
    sender: Sender<Arc<T>>,
    unread: Receiver<Arc<T>>,
}

impl<T> Slot<T> {
    pub(crate) fn open(initial: Arc<T>) -> (Self, Subscription<T>) {
        let (sender, receiver) = flume::bounded(1);
        // Cannot fail: the slot is empty and the receiver is held here.
        sender.try_send(initial).ok();

        let slot = Slot {
            sender,
            unread: receiver.clone(),
        };
        (slot, Subscription(receiver))
    }

    /// Whether the subscription is still held. The slot keeps one receiver
    /// for itself.
    pub(crate) fn is_open(&self) -> bool {
        self.sender.receiver_count() > 1
    }

    /// Replace the unread state, if any, with `state`.
    pub(crate) fn offer(&self, state: Arc<T>) {
        self.unread.try_recv().ok();
        self.sender.try_send(state).ok();
    }
}

type Callback<T> = Box<dyn FnMut(&Arc<T>) + Send + 'static>;

/// Registration handle returned by [`Store::observe`](crate::Store::observe).
///
/// The callback stays registered until this handle is dropped.
#[must_use = "dropping an Observation unregisters its callback"]
pub struct Observation {
    _alive: Arc<()>,
}

/// Store-side end of an [`Observation`].
pub(crate) struct Listener<T> {
    alive: Weak<()>,
    callback: Arc<Mutex<Callback<T>>>,
}

impl<T> Listener<T> {
    pub(crate) fn register<F>(callback: F) -> (Self, Observation)
    where
        F: FnMut(&Arc<T>) + Send + 'static,
    {
        let alive = Arc::new(());
        let listener = Listener {
            alive: Arc::downgrade(&alive),
            callback: Arc::new(Mutex::new(Box::new(callback))),
        };
        (listener, Observation { _alive: alive })
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.upgrade().is_some()
    }

    pub(crate) fn notify(&self, state: &Arc<T>) {
        if self.is_alive() {
            let mut callback = self.callback.lock();
            (*callback)(state);
        }
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            alive: self.alive.clone(),
            callback: self.callback.clone(),
        }
    }
}
