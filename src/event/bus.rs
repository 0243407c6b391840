use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use atomic_refcell::AtomicRefCell;
use indexmap::IndexMap;

use super::{Event, EventFamily, Receiver};
use crate::storage::SparseMap;
use crate::world::World;

/// An erased subscriber callback.
///
/// The cell is what lets an emit run callbacks without borrowing the bus:
/// dispatch clones the `Arc`s out of the signal first, so a callback that
/// subscribes, unsubscribes, or emits again touches the bus freely.
pub(crate) type Callback =
    Arc<AtomicRefCell<Box<dyn FnMut(&World, &dyn Any)>>>;

/// Per-event-type subscriber lists.
pub(crate) struct Events {
    signals: SparseMap<EventFamily, Signal>,
}

/// The subscribers of a single event family, in subscription order.
struct Signal {
    subscribers: IndexMap<ReceiverKey, Callback>,
}

/// The address of the receiver's shared allocation.
///
/// One receiver may subscribe to any number of event types, but only once
/// per type.
type ReceiverKey = usize;

impl Events {
    pub fn new() -> Self {
        let signals = SparseMap::new();

        Self { signals }
    }

    /// Registers a receiver for events of type `E`.
    ///
    /// # Panics
    ///
    /// Panics if this receiver is already subscribed to `E`.
    pub fn subscribe<E: Event, R: Receiver<E>>(
        &mut self,
        receiver: &Arc<AtomicRefCell<R>>,
    ) {
        let key = receiver_key(receiver);
        let signal =
            self.signals.get_or_insert_with(EventFamily::of::<E>(), Signal::new);

        assert!(
            !signal.subscribers.contains_key(&key),
            "receiver `{}` is already subscribed to `{}`",
            type_name::<R>(),
            type_name::<E>(),
        );

        let receiver = Arc::clone(receiver);
        let callback: Box<dyn FnMut(&World, &dyn Any)> =
            Box::new(move |world, event| {
                // SAFETY: the bus only dispatches `E` payloads to `E`'s
                // family
                let event =
                    unsafe { event.downcast_ref::<E>().unwrap_unchecked() };

                receiver.borrow_mut().receive(world, event);
            });

        signal.subscribers.insert(key, Arc::new(AtomicRefCell::new(callback)));
    }

    /// Removes a receiver's subscription to events of type `E`.
    ///
    /// The remaining subscribers keep their relative order.
    ///
    /// # Panics
    ///
    /// Panics if this receiver is not subscribed to `E`.
    pub fn unsubscribe<E: Event, R: Receiver<E>>(
        &mut self,
        receiver: &Arc<AtomicRefCell<R>>,
    ) {
        let key = receiver_key(receiver);
        let removed = self
            .signals
            .get_mut(&EventFamily::of::<E>())
            .and_then(|signal| signal.subscribers.shift_remove(&key));

        assert!(
            removed.is_some(),
            "receiver `{}` is not subscribed to `{}`",
            type_name::<R>(),
            type_name::<E>(),
        );
    }

    /// Clones out the subscriber list for an event type.
    pub fn snapshot<E: Event>(&self) -> Vec<Callback> {
        self.signals
            .get(&EventFamily::of::<E>())
            .map(|signal| signal.subscribers.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl Signal {
    fn new() -> Self {
        let subscribers = IndexMap::new();

        Self { subscribers }
    }
}

fn receiver_key<R>(receiver: &Arc<AtomicRefCell<R>>) -> ReceiverKey {
    Arc::as_ptr(receiver) as *const () as usize
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Events")
            .field("signals", &self.signals.len())
            .finish_non_exhaustive()
    }
}
