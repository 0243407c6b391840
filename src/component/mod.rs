//! Defines components, the values attached to entities, and their
//! per-type bookkeeping: family ids, presence masks, and arenas.

use std::any::TypeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use dashmap::DashMap;

pub use self::mask::*;
pub(crate) use self::arena::*;
pub(crate) use self::info::*;
use crate::storage::SparseIndex;

mod arena;
mod info;
mod mask;

/// The number of distinct component types a [`World`](crate::world::World)
/// can hold.
///
/// Attaching a component of a type past this limit panics.
pub const MAX_COMPONENT_TYPES: usize = 64;

/// A single value attached to an entity.
pub trait Component: Send + Sync + 'static {}

impl<C: Send + Sync + 'static> Component for C {}

/// A dense id for a [`Component`] type.
///
/// Allocated from a process-wide counter on the first use of each concrete
/// type; a given type keeps its id for the lifetime of the process and ids
/// are never reused. Independent of [event](crate::event) family ids.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Family(pub(crate) usize);

impl Family {
    /// Returns the family of the given component type.
    pub fn of<C: Component>() -> Self {
        static REGISTRY: OnceLock<DashMap<TypeId, Family>> = OnceLock::new();
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        *REGISTRY
            .get_or_init(Default::default)
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Self(COUNTER.fetch_add(1, Ordering::Relaxed)))
    }

    /// The dense index of this family.
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl SparseIndex for Family {
    fn sparse_index(&self) -> usize {
        self.0
    }
}
