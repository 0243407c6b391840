use std::fmt;

use super::{Family, MAX_COMPONENT_TYPES};

/// The presence mask of one entity slot.
///
/// One bit per component family records which types are currently
/// attached. One extra bit past [`MAX_COMPONENT_TYPES`] is the tombstone,
/// set while the slot is freed; the bitset is widened by that bit rather
/// than repurposing a component bit. A live slot never has the tombstone
/// set, and a freed slot never has component bits set.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Mask(u128);

impl Mask {
    /// The mask of a live slot with no components attached.
    pub const EMPTY: Self = Self(0);
    /// The mask of a freed slot.
    pub(crate) const TOMBSTONE: Self = Self(1 << MAX_COMPONENT_TYPES);

    /// Sets the bit of a component family.
    pub fn insert(&mut self, family: Family) {
        assert!(
            family.index() < MAX_COMPONENT_TYPES,
            "component family {} is out of range: at most \
             {MAX_COMPONENT_TYPES} distinct component types are supported",
            family.index(),
        );

        self.0 |= 1 << family.index();
    }

    /// Clears the bit of a component family.
    pub fn remove(&mut self, family: Family) {
        self.0 &= !(1 << family.index());
    }

    /// Returns `true` if the family's bit is set.
    pub fn contains(&self, family: Family) -> bool {
        family.index() < MAX_COMPONENT_TYPES
            && self.0 & (1 << family.index()) != 0
    }

    /// Returns `true` if this mask belongs to a live slot that has every
    /// bit of `required` set.
    pub(crate) fn satisfies(&self, required: Mask) -> bool {
        !self.is_tombstoned() && self.0 & required.0 == required.0
    }

    pub(crate) fn is_tombstoned(&self) -> bool {
        self.0 & Self::TOMBSTONE.0 != 0
    }

    /// Returns an iterator over the families whose bits are set.
    pub(crate) fn families(&self) -> impl Iterator<Item = Family> + '_ {
        (0..MAX_COMPONENT_TYPES).map(Family).filter(|family| self.contains(*family))
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tombstoned() {
            f.write_str("Mask(tombstone)")
        } else {
            f.debug_set().entries(self.families().map(|family| family.0)).finish()
        }
    }
}
