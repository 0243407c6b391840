//! Defines entities and the generational slot allocator behind them.

use std::any::type_name;
use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

pub(crate) use self::allocator::*;
use crate::component::Component;

mod allocator;

/// A handle to an entity in a [`World`](crate::world::World).
///
/// Packs a slot index and the slot's version at the time the handle was
/// minted. The handle stops being current once the slot is freed, which
/// bumps the stored version; a stale handle fails every operation with
/// [`EntityNotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) version: u32,
}

impl Entity {
    /// The conventional invalid handle, index 0 at version 0.
    ///
    /// Note that the very first entity spawned into a fresh world also
    /// has index 0 and version 0; the two are told apart by context only.
    pub const INVALID: Self = Self { index: 0, version: 0 };

    pub(crate) const fn new(index: u32, version: u32) -> Self {
        Self { index, version }
    }

    /// The slot index of this handle.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// The slot version this handle was minted at.
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Packs this handle into a single 64-bit value, index in the high
    /// half so packed-value order is slot order.
    pub const fn to_bits(self) -> u64 {
        (self.index as u64) << 32 | self.version as u64
    }

    /// Unpacks a handle from its [`Entity::to_bits`] representation.
    pub const fn from_bits(bits: u64) -> Self {
        Self { index: (bits >> 32) as u32, version: bits as u32 }
    }
}

/// Ordered by the packed 64-bit value.
impl Ord for Entity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bits().cmp(&other.to_bits())
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An error for when a handle does not refer to a live entity.
#[derive(Debug, Clone, Copy, Error)]
#[error("entity not found: {0:?}")]
pub struct EntityNotFound(pub Entity);

/// An error for when an entity does not have a requested component.
#[derive(Debug, Clone, Copy, Error)]
#[error("component `{type_name}` not found for {entity:?}")]
pub struct ComponentNotFound {
    pub entity: Entity,
    type_name: &'static str,
}

impl ComponentNotFound {
    pub(crate) fn new<C: Component>(entity: Entity) -> Self {
        Self { entity, type_name: type_name::<C>() }
    }

    /// The name of the missing component type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_round_trip() {
        let entity = Entity::new(17, 3);

        assert_eq!(Entity::from_bits(entity.to_bits()), entity);
    }

    #[test]
    fn ordered_by_packed_value() {
        let old = Entity::new(17, 3);
        let reused = Entity::new(17, 4);
        let later = Entity::new(18, 0);

        assert!(old < reused);
        assert!(old < later);
    }
}
