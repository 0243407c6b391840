use std::alloc::{alloc, dealloc, Layout};
use std::any::TypeId;
use std::fmt;
use std::ptr::NonNull;

use super::ComponentInfo;

/// The number of elements per arena chunk.
const CHUNK_LEN: usize = 64;

/// Type-erased storage for a single component type, indexed by slot.
///
/// Elements live in whole fixed-size chunks that are appended on growth
/// and never reallocated or freed until the arena drops, so the address
/// of an element is stable for the arena's lifetime regardless of other
/// slots' churn. The arena does not track which slots hold constructed
/// values; the caller owns that bookkeeping.
pub(crate) struct Arena {
    info: ComponentInfo,
    chunks: Vec<NonNull<u8>>,
}

impl Arena {
    pub fn new(info: ComponentInfo) -> Self {
        let chunks = Vec::new();

        Self { info, chunks }
    }

    fn is_zst(&self) -> bool {
        self.info.layout().size() == 0
    }

    /// The distance in bytes between adjacent elements.
    fn stride(&self) -> usize {
        self.info.layout().pad_to_align().size()
    }

    fn chunk_layout(&self) -> Layout {
        Layout::from_size_align(
            self.stride() * CHUNK_LEN,
            self.info.layout().align(),
        )
        .expect("chunk layout overflow")
    }

    /// The number of slots this arena can currently address.
    pub fn capacity(&self) -> usize {
        if self.is_zst() {
            usize::MAX
        } else {
            self.chunks.len() * CHUNK_LEN
        }
    }

    /// Grows the arena by whole chunks until `slot` is addressable.
    pub fn reserve(&mut self, slot: usize) {
        if self.is_zst() {
            return;
        }

        while self.capacity() <= slot {
            let chunk = NonNull::new(unsafe { alloc(self.chunk_layout()) })
                .expect("global allocation failure");

            self.chunks.push(chunk);
        }
    }

    /// Returns a pointer to a slot's storage, growing to cover it if it is
    /// out of range.
    pub fn ptr_or_grow(&mut self, slot: usize) -> NonNull<u8> {
        self.reserve(slot);

        self.ptr(slot)
    }

    /// Returns a pointer to a slot's storage.
    ///
    /// The slot must be within [`Arena::capacity`].
    pub fn ptr(&self, slot: usize) -> NonNull<u8> {
        debug_assert!(slot < self.capacity());

        if self.is_zst() {
            // aligned dangling pointer, ZSTs are never read through it
            return NonNull::new(self.info.layout().align() as *mut u8)
                .expect("alignment is non-zero");
        }

        let chunk = self.chunks[slot / CHUNK_LEN];

        unsafe { chunk.byte_add((slot % CHUNK_LEN) * self.stride()) }
    }

    /// Moves a value into a slot, growing to cover it if necessary.
    ///
    /// # Safety
    ///
    /// `C` must be the type this arena was created for, and the slot must
    /// not currently hold a constructed value.
    pub unsafe fn write<C: 'static>(&mut self, slot: usize, value: C) {
        debug_assert_eq!(TypeId::of::<C>(), self.info.type_id());

        let ptr = self.ptr_or_grow(slot).cast::<C>();

        unsafe { ptr.as_ptr().write(value) };
    }

    /// Borrows the value in a slot.
    ///
    /// # Safety
    ///
    /// `C` must be the type this arena was created for, and the slot must
    /// hold a constructed value.
    pub unsafe fn get<C: 'static>(&self, slot: usize) -> &C {
        debug_assert_eq!(TypeId::of::<C>(), self.info.type_id());

        unsafe { self.ptr(slot).cast::<C>().as_ref() }
    }

    /// Mutably borrows the value in a slot.
    ///
    /// # Safety
    ///
    /// `C` must be the type this arena was created for, and the slot must
    /// hold a constructed value.
    pub unsafe fn get_mut<C: 'static>(&mut self, slot: usize) -> &mut C {
        debug_assert_eq!(TypeId::of::<C>(), self.info.type_id());

        unsafe { &mut *self.ptr(slot).cast::<C>().as_ptr() }
    }

    /// Drops the value in a slot without deallocating its storage.
    ///
    /// # Safety
    ///
    /// The slot must hold a constructed value, and the value must not be
    /// used or dropped again afterwards.
    pub unsafe fn drop_in_place(&mut self, slot: usize) {
        let drop = self.info.drop();

        unsafe { drop(self.ptr(slot).as_ptr()) };
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        // constructed values were already dropped by the owner; only the
        // chunk memory remains
        for chunk in &self.chunks {
            unsafe { dealloc(chunk.as_ptr(), self.chunk_layout()) };
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&format!("Arena<{}>", self.info.type_name()))
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn write_and_read_back() {
        let mut arena = Arena::new(ComponentInfo::of::<u64>());

        unsafe {
            arena.write(0, 123_u64);
            arena.write(5, 456_u64);

            assert_eq!(*arena.get::<u64>(0), 123);
            assert_eq!(*arena.get::<u64>(5), 456);

            *arena.get_mut::<u64>(0) += 1;

            assert_eq!(*arena.get::<u64>(0), 124);

            arena.drop_in_place(0);
            arena.drop_in_place(5);
        }
    }

    #[test]
    fn growth_never_moves_elements() {
        let mut arena = Arena::new(ComponentInfo::of::<u32>());

        unsafe { arena.write(0, 7_u32) };

        let before = arena.ptr(0);

        // force several new chunks
        arena.reserve(CHUNK_LEN * 4);

        assert_eq!(before, arena.ptr(0));
        assert_eq!(unsafe { *arena.get::<u32>(0) }, 7);

        unsafe { arena.drop_in_place(0) };
    }

    #[test]
    fn drop_in_place_runs_destructor_once() {
        struct Droppable(Arc<AtomicUsize>);

        impl Drop for Droppable {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let mut arena = Arena::new(ComponentInfo::of::<Droppable>());

        unsafe { arena.write(3, Droppable(drops.clone())) };

        assert_eq!(drops.load(Ordering::Relaxed), 0);

        unsafe { arena.drop_in_place(3) };

        assert_eq!(drops.load(Ordering::Relaxed), 1);

        drop(arena);

        // dropping the arena frees chunks but runs no destructors
        assert_eq!(drops.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn zst_components_never_allocate() {
        struct Marker;

        let mut arena = Arena::new(ComponentInfo::of::<Marker>());

        arena.reserve(10_000);

        assert_eq!(arena.capacity(), usize::MAX);
        assert!(arena.chunks.is_empty());

        unsafe {
            arena.write(10_000, Marker);
            arena.drop_in_place(10_000);
        }
    }
}
