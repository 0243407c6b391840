//! Defines the [`World`], the owner of all entity and component state.

use std::any::type_name;
use std::sync::Arc;

use atomic_refcell::AtomicRefCell;
use log::warn;

pub use self::lifecycle::*;
use crate::component::{
    Arena, Component, ComponentInfo, Family, Mask, MAX_COMPONENT_TYPES,
};
use crate::entity::{ComponentNotFound, Entities, Entity, EntityNotFound};
use crate::event::{Event, Events, Receiver};
use crate::storage::SparseMap;
use crate::view::{View, ViewFilter};

mod lifecycle;
#[cfg(test)]
mod tests;

/// Owns every entity slot, presence mask, component arena, and the event
/// bus, and is the sole authority on entity lifecycle.
///
/// All operations are synchronous and single-threaded; callers needing
/// concurrent access must serialize it themselves.
#[derive(Debug)]
pub struct World {
    pub(crate) entities: Entities,
    pub(crate) masks: Vec<Mask>,
    pub(crate) arenas: SparseMap<Family, Arena>,
    pub(crate) events: Events,
}

impl World {
    /// Creates a new empty world.
    pub fn new() -> Self {
        let entities = Entities::new();
        let masks = Vec::new();
        let arenas = SparseMap::new();
        let events = Events::new();

        Self { entities, masks, arenas, events }
    }

    /// Returns the count of live entities in this world.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if this world contains no live entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns `true` if the handle refers to a live entity.
    ///
    /// Validity is generational: the handle's version is compared against
    /// the slot's current version (see [`Entity`] for the exact rule).
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    /// Reconstructs the current handle for a slot index.
    ///
    /// Returns `None` if the index was never allocated or the slot is
    /// currently freed.
    pub fn handle_of(&self, index: u32) -> Option<Entity> {
        self.entities
            .handle_of(index)
            .filter(|_| !self.masks[index as usize].is_tombstoned())
    }

    /// Spawns a new empty entity.
    ///
    /// Reuses the most recently freed slot if one is pending, otherwise
    /// appends a fresh slot and grows every arena and the mask table to
    /// cover it. Emits [`EntitySpawned`] once the slot is live.
    pub fn spawn(&mut self) -> Entity {
        let entity = self.entities.alloc();
        let index = entity.index() as usize;

        if index >= self.masks.len() {
            self.masks.resize(index + 1, Mask::EMPTY);
        }

        for arena in self.arenas.values_mut() {
            arena.reserve(index);
        }

        // clears the tombstone of a reused slot
        self.masks[index] = Mask::EMPTY;

        self.emit(EntitySpawned { entity });

        entity
    }

    /// Despawns an entity, dropping all of its components.
    ///
    /// [`EntityDespawned`] is emitted *before* anything is torn down, so
    /// subscribers still observe a valid handle and full component state.
    /// Once this returns, the handle (and every copy of it) is invalid.
    ///
    /// Returns an error if the handle is stale or the slot is already
    /// freed.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), EntityNotFound> {
        let index = entity.index() as usize;

        if !self.contains(entity) || self.masks[index].is_tombstoned() {
            return Err(EntityNotFound(entity));
        }

        self.emit(EntityDespawned { entity });

        let mask = self.masks[index];

        for family in mask.families() {
            // SAFETY: a set mask bit means the family's arena exists and
            // the slot holds a constructed value
            unsafe {
                self.arenas
                    .get_mut(&family)
                    .unwrap_unchecked()
                    .drop_in_place(index);
            }
        }

        self.masks[index] = Mask::TOMBSTONE;
        self.entities.free(entity);

        Ok(())
    }

    /// Despawns every live entity.
    pub fn clear(&mut self) {
        let live: Vec<_> = self.view::<()>().collect();

        for entity in live {
            // handles collected from a view of this world are live
            let _ = self.despawn(entity);
        }
    }
}

/// # Component methods
impl World {
    /// Returns `true` if the entity is live and has a `C` attached.
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        self.contains(entity)
            && self.masks[entity.index() as usize].contains(Family::of::<C>())
    }

    /// Attaches a component to an entity, creating the component's arena
    /// on the first attach of its type.
    ///
    /// Emits [`Inserted<C>`] after the value is constructed and before
    /// the presence bit is set. If the entity already has a `C`, that is
    /// a caller bug: a warning is logged and the existing value is
    /// returned untouched.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_COMPONENT_TYPES`] distinct component
    /// types are attached process-wide. The panic happens up front,
    /// before the value is stored or any event fires.
    pub fn insert<C: Component>(
        &mut self,
        entity: Entity,
        component: C,
    ) -> Result<&mut C, EntityNotFound> {
        let family = Family::of::<C>();

        assert!(
            family.index() < MAX_COMPONENT_TYPES,
            "component family {} is out of range: at most \
             {MAX_COMPONENT_TYPES} distinct component types are supported",
            family.index(),
        );

        let index = entity.index() as usize;

        if !self.contains(entity) || self.masks[index].is_tombstoned() {
            return Err(EntityNotFound(entity));
        }

        if self.masks[index].contains(family) {
            warn!(
                "`{}` is already attached to {entity}; keeping the existing \
                 value",
                type_name::<C>(),
            );
        } else {
            let arena = self
                .arenas
                .get_or_insert_with(family, || Arena::new(ComponentInfo::of::<C>()));

            // SAFETY: the arena is keyed by `C`'s family, and the clear
            // mask bit means the slot holds no value
            unsafe { arena.write(index, component) };

            self.emit(Inserted::<C>::new(entity));
            self.masks[index].insert(family);
        }

        // SAFETY: the mask bit is set, so the arena exists and the slot
        // holds a `C`
        Ok(unsafe {
            self.arenas.get_mut(&family).unwrap_unchecked().get_mut(index)
        })
    }

    /// Detaches and drops an entity's `C`.
    ///
    /// Emits [`Removed<C>`] *before* the value is dropped, so subscribers
    /// can still read it. Removing a component the entity doesn't have
    /// logs a warning and is otherwise a no-op.
    pub fn remove<C: Component>(
        &mut self,
        entity: Entity,
    ) -> Result<(), EntityNotFound> {
        if !self.contains(entity) {
            return Err(EntityNotFound(entity));
        }

        let family = Family::of::<C>();
        let index = entity.index() as usize;

        if !self.masks[index].contains(family) {
            warn!(
                "`{}` is not attached to {entity}; nothing to remove",
                type_name::<C>(),
            );

            return Ok(());
        }

        self.emit(Removed::<C>::new(entity));

        // SAFETY: the mask bit is set, so the arena exists and the slot
        // holds a constructed `C`
        unsafe {
            self.arenas.get_mut(&family).unwrap_unchecked().drop_in_place(index);
        }

        self.masks[index].remove(family);

        Ok(())
    }

    /// Borrows an entity's `C`.
    pub fn get<C: Component>(
        &self,
        entity: Entity,
    ) -> Result<&C, ComponentNotFound> {
        if !self.has::<C>(entity) {
            return Err(ComponentNotFound::new::<C>(entity));
        }

        // SAFETY: `has` checked the mask bit
        Ok(unsafe {
            self.arenas
                .get(&Family::of::<C>())
                .unwrap_unchecked()
                .get(entity.index() as usize)
        })
    }

    /// Mutably borrows an entity's `C`.
    pub fn get_mut<C: Component>(
        &mut self,
        entity: Entity,
    ) -> Result<&mut C, ComponentNotFound> {
        if !self.has::<C>(entity) {
            return Err(ComponentNotFound::new::<C>(entity));
        }

        // SAFETY: `has` checked the mask bit
        Ok(unsafe {
            self.arenas
                .get_mut(&Family::of::<C>())
                .unwrap_unchecked()
                .get_mut(entity.index() as usize)
        })
    }

    /// Returns a [`View`] over the live entities matching a filter.
    ///
    /// `world.view::<()>()` iterates every live entity;
    /// `world.view::<(A, B)>()` only those with both `A` and `B`.
    pub fn view<F: ViewFilter>(&self) -> View<'_> {
        View::new(self, F::required())
    }
}

/// # Event methods
impl World {
    /// Subscribes a receiver to events of type `E`.
    ///
    /// # Panics
    ///
    /// Panics if this receiver is already subscribed to `E`.
    pub fn subscribe<E: Event, R: Receiver<E>>(
        &mut self,
        receiver: &Arc<AtomicRefCell<R>>,
    ) {
        self.events.subscribe::<E, R>(receiver);
    }

    /// Removes a receiver's subscription to events of type `E`.
    ///
    /// # Panics
    ///
    /// Panics if this receiver is not subscribed to `E`.
    pub fn unsubscribe<E: Event, R: Receiver<E>>(
        &mut self,
        receiver: &Arc<AtomicRefCell<R>>,
    ) {
        self.events.unsubscribe::<E, R>(receiver);
    }

    /// Synchronously delivers an event to every subscriber, in
    /// subscription order.
    ///
    /// The event value's lifetime ends when this returns; receivers must
    /// not try to keep it. The subscriber list is snapshotted before
    /// dispatch, so callbacks may emit further events re-entrantly. A
    /// receiver whose callback re-enters *itself* (directly or through a
    /// cycle of events) panics on the receiver borrow.
    pub fn emit<E: Event>(&self, event: E) {
        for callback in self.events.snapshot::<E>() {
            (*callback.borrow_mut())(self, &event);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        // force-destroy components of still-live slots; no events fire
        // during teardown
        for index in 0..self.masks.len() {
            let mask = self.masks[index];

            if mask.is_tombstoned() {
                continue;
            }

            for family in mask.families() {
                // SAFETY: a set bit means the arena exists and the slot
                // is constructed
                unsafe {
                    self.arenas
                        .get_mut(&family)
                        .unwrap_unchecked()
                        .drop_in_place(index);
                }
            }
        }
    }
}
