//! The lifecycle events emitted by a [`World`](super::World).

use std::fmt;
use std::marker::PhantomData;

use crate::component::Component;
use crate::entity::Entity;

/// Emitted after a new entity's slot is live.
///
/// The handle is valid during the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySpawned {
    pub entity: Entity,
}

/// Emitted before a despawned entity is torn down.
///
/// The handle is still valid and every component still readable during
/// the callback; both are gone once the despawn returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDespawned {
    pub entity: Entity,
}

/// Emitted after a `C` is constructed for an entity.
pub struct Inserted<C: Component> {
    pub entity: Entity,
    _marker: PhantomData<fn() -> C>,
}

/// Emitted before an entity's `C` is dropped.
pub struct Removed<C: Component> {
    pub entity: Entity,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Component> Inserted<C> {
    pub(crate) fn new(entity: Entity) -> Self {
        Self { entity, _marker: PhantomData }
    }
}

impl<C: Component> Removed<C> {
    pub(crate) fn new(entity: Entity) -> Self {
        Self { entity, _marker: PhantomData }
    }
}

// manual impls to avoid bounding `C`

impl<C: Component> Clone for Inserted<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Component> Copy for Inserted<C> {}

impl<C: Component> fmt::Debug for Inserted<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&format!("Inserted<{}>", std::any::type_name::<C>()))
            .field("entity", &self.entity)
            .finish()
    }
}

impl<C: Component> Clone for Removed<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Component> Copy for Removed<C> {}

impl<C: Component> fmt::Debug for Removed<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&format!("Removed<{}>", std::any::type_name::<C>()))
            .field("entity", &self.entity)
            .finish()
    }
}
