//! A generational entity/component store with typed lifecycle events.
//!
//! Entities are slots identified by an [`Entity`](entity::Entity) handle
//! carrying the slot's version; component values live in per-type arenas
//! that never move them; per-slot presence masks drive filtered
//! [views](view::View); and a synchronous [event bus](event) notifies
//! subscribers of entity and component lifecycle changes.

#![forbid(unsafe_op_in_unsafe_fn)]

pub mod component;
pub mod entity;
pub mod event;
mod storage;
pub mod view;
pub mod world;

/// Re-export of all items in this crate.
pub mod prelude {
    pub use crate::component::*;
    pub use crate::entity::*;
    pub use crate::event::*;
    pub use crate::view::*;
    pub use crate::world::*;
}
