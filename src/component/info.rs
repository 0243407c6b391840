use std::alloc::Layout;
use std::any::{type_name, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

use super::Component;

/// The erased description of a component type.
///
/// Captured at the first use of each concrete type and stored by the
/// arena so it can address and drop elements without knowing their type.
#[derive(Clone, Copy)]
pub(crate) struct ComponentInfo {
    inner: &'static dyn ComponentVTable,
}

/// Trait for types that provide the erased methods of a [`Component`].
///
/// # Safety
///
/// [`ComponentVTable::drop`] must drop the component represented by this
/// vtable.
unsafe trait ComponentVTable: Send + Sync + 'static {
    /// Returns the type id of the component.
    fn type_id(&self) -> TypeId;

    /// Returns the [type name](std::any::type_name) of the component.
    fn type_name(&self) -> &'static str;

    /// Returns the layout of the component in memory.
    fn layout(&self) -> Layout;

    /// Returns a function that [drops the component
    /// in-place](std::ptr::drop_in_place).
    fn drop(&self) -> unsafe fn(*mut u8);
}

impl ComponentInfo {
    /// Returns the component info of the provided component.
    pub const fn of<C: Component>() -> Self {
        Self { inner: &PhantomData::<C> }
    }

    pub fn type_id(&self) -> TypeId {
        self.inner.type_id()
    }

    pub fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    pub fn layout(&self) -> Layout {
        self.inner.layout()
    }

    pub fn drop(&self) -> unsafe fn(*mut u8) {
        self.inner.drop()
    }
}

/// # Safety
///
/// [`ComponentVTable::drop`] is a valid drop function pointer.
unsafe impl<C: Component> ComponentVTable for PhantomData<C> {
    fn type_id(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn type_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn layout(&self) -> Layout {
        Layout::new::<C>()
    }

    fn drop(&self) -> unsafe fn(*mut u8) {
        |ptr| unsafe { ptr::drop_in_place(ptr.cast::<C>()) }
    }
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("type_name", &self.type_name())
            .finish_non_exhaustive()
    }
}
