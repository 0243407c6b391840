//! Defines the typed publish/subscribe bus for lifecycle and user events.
//!
//! Subscribers implement [`Receiver`] for each event type they care about
//! and are shared as `Arc<AtomicRefCell<_>>` (see [`shared`]). Emission is
//! synchronous: [`World::emit`](crate::world::World::emit) invokes every
//! subscriber in subscription order before returning, and the event value
//! dies when it returns.

use std::any::TypeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

pub use atomic_refcell::AtomicRefCell;
use dashmap::DashMap;

pub(crate) use self::bus::*;
use crate::storage::SparseIndex;
use crate::world::World;

mod bus;

/// A value emitted through the event bus.
pub trait Event: 'static {}

impl<E: 'static> Event for E {}

/// A subscriber to events of type `E`.
pub trait Receiver<E: Event>: 'static {
    /// Called once per emission of `E`, in subscription order.
    ///
    /// The event borrow ends when the emit call returns; receivers must
    /// copy out anything they want to keep.
    fn receive(&mut self, world: &World, event: &E);
}

impl<E: Event, F: FnMut(&World, &E) + 'static> Receiver<E> for F {
    fn receive(&mut self, world: &World, event: &E) {
        self(world, event)
    }
}

/// Wraps a receiver for sharing between the caller and the bus.
pub fn shared<R>(receiver: R) -> Arc<AtomicRefCell<R>> {
    Arc::new(AtomicRefCell::new(receiver))
}

/// A dense id for an [`Event`] type.
///
/// Allocated like component [families](crate::component::Family) but from
/// an independent registry, so component and event ids never interact.
/// Unlike component families, event families are not bounded.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EventFamily(usize);

impl EventFamily {
    pub fn of<E: Event>() -> Self {
        static REGISTRY: OnceLock<DashMap<TypeId, EventFamily>> =
            OnceLock::new();
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        *REGISTRY
            .get_or_init(Default::default)
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Self(COUNTER.fetch_add(1, Ordering::Relaxed)))
    }
}

impl SparseIndex for EventFamily {
    fn sparse_index(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_families_are_unique_and_stable() {
        struct A;
        struct B;

        assert_ne!(EventFamily::of::<A>(), EventFamily::of::<B>());
        assert_eq!(EventFamily::of::<A>(), EventFamily::of::<A>());
    }
}
