// Free-list scheme adapted from
// [HECS](https://github.com/Ralith/hecs/blob/ed23dedf77602756ffad2194558d7b23f54e2fc1/src/entities.rs).

use super::Entity;

/// Manages the entity slots of a [`World`](crate::world::World).
///
/// Slots are never removed; freeing a slot bumps its version (invalidating
/// outstanding handles) and queues the index for reuse.
#[derive(Debug)]
pub(crate) struct Entities {
    slots: Vec<Slot>,
    pending: Vec<u32>,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    version: u32,
}

impl Entities {
    pub fn new() -> Self {
        let slots = Vec::new();
        let pending = Vec::new();

        Self { slots, pending }
    }

    /// Amount of live entities.
    pub fn len(&self) -> usize {
        self.slots.len() - self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots ever allocated, live or freed.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether the handle is current for its slot.
    ///
    /// The comparison is `>=`, not `==`: a handle minted against a higher
    /// version than the slot has reached is tolerated. Such handles never
    /// arise from [`Entities::alloc`]; the comparison is kept this way to
    /// match the validity rule this store was specified with.
    pub fn contains(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index as usize)
            .is_some_and(|slot| entity.version >= slot.version)
    }

    /// Reconstructs the current handle for a slot index.
    ///
    /// Returns `None` if the index was never allocated.
    pub fn handle_of(&self, index: u32) -> Option<Entity> {
        self.slots
            .get(index as usize)
            .map(|slot| Entity::new(index, slot.version))
    }

    /// Allocate a new entity, reusing a freed slot if one is pending.
    ///
    /// A reused slot keeps the version it was bumped to when freed; a
    /// fresh slot starts at version 0.
    pub fn alloc(&mut self) -> Entity {
        if let Some(index) = self.pending.pop() {
            Entity::new(index, self.slots[index as usize].version)
        } else {
            let index =
                u32::try_from(self.slots.len()).expect("entity overflow");

            self.slots.push(Slot { version: 0 });

            Entity::new(index, 0)
        }
    }

    /// Free an entity's slot, allowing its index to be reused.
    ///
    /// The caller must have checked [`Entities::contains`] first.
    pub fn free(&mut self, entity: Entity) {
        let slot = &mut self.slots[entity.index as usize];

        slot.version += 1;
        self.pending.push(entity.index);
    }
}

impl Default for Entities {
    fn default() -> Self {
        Self::new()
    }
}
