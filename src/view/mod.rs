//! Defines views, filtered traversals over the live entities of a
//! [`World`](crate::world::World).

use crate::component::{Component, Family, Mask};
use crate::entity::Entity;
use crate::world::World;

/// A lazy traversal over every live slot whose presence mask contains a
/// set of required component families.
///
/// Yields [`Entity`] handles in ascending slot order, each reconstructed
/// from the slot's current version. A view scans every slot ever
/// allocated, which is fine for the entity counts this store is built for
/// but is the scalability limit of the scheme.
///
/// Views do not guard against mutation during traversal: despawning or
/// spawning entities mid-iteration changes which slots the remainder of
/// the scan observes. That is the caller's responsibility.
pub struct View<'w> {
    world: &'w World,
    required: Mask,
    index: usize,
}

/// A component-type filter for a [`View`].
///
/// Implemented for `()` (no filter, every live entity) and for tuples of
/// components up to arity 8.
pub trait ViewFilter {
    /// The mask of families a slot must contain to be yielded.
    fn required() -> Mask;
}

impl<'w> View<'w> {
    pub(crate) fn new(world: &'w World, required: Mask) -> Self {
        let index = 0;

        Self { world, required, index }
    }
}

impl Iterator for View<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.world.masks.len() {
            let index = self.index;

            self.index += 1;

            if self.world.masks[index].satisfies(self.required) {
                return self.world.entities.handle_of(index as u32);
            }
        }

        None
    }
}

impl ViewFilter for () {
    fn required() -> Mask {
        Mask::EMPTY
    }
}

macro_rules! impl_view_filter {
    ($($t:ident),+) => {
        impl<$($t: Component),+> ViewFilter for ($($t,)+) {
            fn required() -> Mask {
                let mut mask = Mask::EMPTY;

                $(
                    mask.insert(Family::of::<$t>());
                )+

                mask
            }
        }
    };
}

impl_view_filter!(A);
impl_view_filter!(A, B);
impl_view_filter!(A, B, C);
impl_view_filter!(A, B, C, D);
impl_view_filter!(A, B, C, D, E);
impl_view_filter!(A, B, C, D, E, F);
impl_view_filter!(A, B, C, D, E, F, G);
impl_view_filter!(A, B, C, D, E, F, G, H);
