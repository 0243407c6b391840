use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::prelude::*;

struct Health(i32);
struct Armor(#[allow(unused)] u32);

#[test]
fn len_tracks_spawns_and_despawns() {
    let mut world = World::new();

    assert!(world.is_empty());

    let entities: Vec<_> = (0..10).map(|_| world.spawn()).collect();

    assert_eq!(world.len(), 10);

    for entity in &entities[..4] {
        world.despawn(*entity).unwrap();
    }

    assert_eq!(world.len(), 6);

    // reuse churn doesn't disturb the count
    for _ in 0..4 {
        world.spawn();
    }

    assert_eq!(world.len(), 10);
}

#[test]
fn freed_slots_are_reused_with_a_bumped_version() {
    let mut world = World::new();

    let original = world.spawn();

    world.despawn(original).unwrap();

    let reused = world.spawn();

    assert_eq!(reused.index(), original.index());
    assert_eq!(reused.version(), original.version() + 1);
    assert!(world.contains(reused));
    assert!(!world.contains(original));
}

#[test]
fn component_round_trip() {
    let mut world = World::new();
    let entity = world.spawn();

    assert!(!world.has::<Health>(entity));

    world.insert(entity, Health(42)).unwrap();

    assert!(world.has::<Health>(entity));
    assert_eq!(world.get::<Health>(entity).unwrap().0, 42);

    world.get_mut::<Health>(entity).unwrap().0 += 1;

    assert_eq!(world.get::<Health>(entity).unwrap().0, 43);

    world.remove::<Health>(entity).unwrap();

    assert!(!world.has::<Health>(entity));
    assert!(world.get::<Health>(entity).is_err());
}

#[test]
fn reinsert_keeps_the_existing_value() {
    let mut world = World::new();
    let entity = world.spawn();

    world.insert(entity, Health(1)).unwrap();

    // a caller bug: warned about, not fatal
    let existing = world.insert(entity, Health(9)).unwrap();

    assert_eq!(existing.0, 1);
    assert_eq!(world.get::<Health>(entity).unwrap().0, 1);
}

#[test]
fn remove_absent_component_is_a_no_op() {
    let mut world = World::new();
    let entity = world.spawn();

    world.remove::<Health>(entity).unwrap();

    assert!(!world.has::<Health>(entity));
}

#[test]
fn stale_handles_fail_every_operation() {
    let mut world = World::new();
    let entity = world.spawn();

    world.insert(entity, Health(1)).unwrap();
    world.despawn(entity).unwrap();

    assert!(!world.contains(entity));
    assert!(!world.has::<Health>(entity));
    assert!(world.insert(entity, Health(2)).is_err());
    assert!(world.remove::<Health>(entity).is_err());
    assert!(world.get::<Health>(entity).is_err());
    assert!(world.despawn(entity).is_err());

    // ... even after the slot is reused
    let reused = world.spawn();

    assert_eq!(reused.index(), entity.index());
    assert!(!world.contains(entity));
}

#[test]
fn forged_future_handles_cannot_touch_freed_slots() {
    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    let drops = Arc::new(AtomicUsize::new(0));
    let mut world = World::new();
    let entity = world.spawn();

    world.despawn(entity).unwrap();

    // a handle claiming the freed slot's bumped version passes the
    // generational comparison on its own
    let forged = Entity::from_bits(
        (entity.index() as u64) << 32 | (entity.version() as u64 + 1),
    );

    assert!(world.contains(forged));
    assert!(world.insert(forged, Tracked(drops.clone())).is_err());
    assert!(!world.has::<Tracked>(forged));
    assert!(world.despawn(forged).is_err());

    // nothing landed in the freed slot, so reuse starts clean
    let reused = world.spawn();

    assert_eq!(reused.index(), entity.index());
    assert!(!world.has::<Tracked>(reused));
    assert_eq!(drops.load(Ordering::Relaxed), 1);
}

#[test]
fn handle_of_reconstructs_live_handles_only() {
    let mut world = World::new();
    let entity = world.spawn();

    assert_eq!(world.handle_of(entity.index()), Some(entity));
    assert_eq!(world.handle_of(100), None);

    world.despawn(entity).unwrap();

    assert_eq!(world.handle_of(entity.index()), None);
}

#[test]
fn components_survive_other_entities_churn() {
    let mut world = World::new();

    let keeper = world.spawn();

    world.insert(keeper, Health(7)).unwrap();

    // enough live slots to force the arenas past several chunks
    let churn: Vec<_> = (0..300).map(|_| world.spawn()).collect();

    for &entity in &churn {
        world.insert(entity, Health(0)).unwrap();
        world.insert(entity, Armor(0)).unwrap();
    }

    for &entity in &churn {
        world.despawn(entity).unwrap();
    }

    assert_eq!(world.len(), 1);
    assert_eq!(world.get::<Health>(keeper).unwrap().0, 7);
}

#[test]
fn despawn_and_teardown_drop_components() {
    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    let drops = Arc::new(AtomicUsize::new(0));
    let mut world = World::new();

    let a = world.spawn();
    let b = world.spawn();

    world.insert(a, Tracked(drops.clone())).unwrap();
    world.insert(b, Tracked(drops.clone())).unwrap();

    world.despawn(a).unwrap();

    assert_eq!(drops.load(Ordering::Relaxed), 1);

    // the slot is reused but its component was already dropped
    world.spawn();

    drop(world);

    assert_eq!(drops.load(Ordering::Relaxed), 2);
}

#[test]
fn clear_despawns_all_entities() {
    let mut world = World::new();
    let entities: Vec<_> = (0..10).map(|_| world.spawn()).collect();

    world.clear();

    assert!(world.is_empty());

    for entity in entities {
        assert!(!world.contains(entity));
    }
}

// events
// ------

#[test]
fn subscribers_fire_in_subscription_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut world = World::new();

    let first = {
        let log = log.clone();

        shared(move |world: &World, event: &EntitySpawned| {
            assert!(world.contains(event.entity));
            log.borrow_mut().push("first");
        })
    };
    let second = {
        let log = log.clone();

        shared(move |world: &World, event: &EntitySpawned| {
            assert!(world.contains(event.entity));
            log.borrow_mut().push("second");
        })
    };

    world.subscribe::<EntitySpawned, _>(&first);
    world.subscribe::<EntitySpawned, _>(&second);

    world.spawn();

    assert_eq!(*log.borrow(), ["first", "second"]);
}

#[test]
fn unsubscribe_preserves_the_order_of_the_rest() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut world = World::new();

    let receivers: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|name| {
            let log = log.clone();

            shared(move |_: &World, _: &EntitySpawned| {
                log.borrow_mut().push(name);
            })
        })
        .collect();

    for receiver in &receivers {
        world.subscribe::<EntitySpawned, _>(receiver);
    }

    world.unsubscribe::<EntitySpawned, _>(&receivers[1]);
    world.spawn();

    assert_eq!(*log.borrow(), ["a", "c"]);
}

#[test]
fn despawn_notifies_before_teardown() {
    let observed = Rc::new(Cell::new(None));
    let mut world = World::new();
    let entity = world.spawn();

    world.insert(entity, Health(5)).unwrap();

    let receiver = {
        let observed = observed.clone();

        shared(move |world: &World, event: &EntityDespawned| {
            let valid = world.contains(event.entity);
            let health =
                world.get::<Health>(event.entity).map(|health| health.0).ok();

            observed.set(Some((valid, health)));
        })
    };

    world.subscribe::<EntityDespawned, _>(&receiver);
    world.despawn(entity).unwrap();

    // the subscriber saw the entity fully intact
    assert_eq!(observed.get(), Some((true, Some(5))));
    // and it was gone the moment `despawn` returned
    assert!(!world.contains(entity));
}

#[test]
fn inserted_fires_after_construction_before_the_presence_bit() {
    let observed = Rc::new(Cell::new(None));
    let mut world = World::new();
    let entity = world.spawn();

    let receiver = {
        let observed = observed.clone();

        shared(move |world: &World, event: &Inserted<Health>| {
            observed.set(Some(world.has::<Health>(event.entity)));
        })
    };

    world.subscribe::<Inserted<Health>, _>(&receiver);
    world.insert(entity, Health(1)).unwrap();

    assert_eq!(observed.get(), Some(false));
    assert!(world.has::<Health>(entity));
}

#[test]
fn removed_fires_while_the_component_is_still_readable() {
    let observed = Rc::new(Cell::new(None));
    let mut world = World::new();
    let entity = world.spawn();

    world.insert(entity, Health(3)).unwrap();

    let receiver = {
        let observed = observed.clone();

        shared(move |world: &World, event: &Removed<Health>| {
            observed.set(
                world.get::<Health>(event.entity).map(|health| health.0).ok(),
            );
        })
    };

    world.subscribe::<Removed<Health>, _>(&receiver);
    world.remove::<Health>(entity).unwrap();

    assert_eq!(observed.get(), Some(3));
    assert!(!world.has::<Health>(entity));
}

#[test]
fn reentrant_emission_is_permitted() {
    struct Outer;
    struct Inner;

    let log = Rc::new(RefCell::new(Vec::new()));
    let mut world = World::new();

    let inner_receiver = {
        let log = log.clone();

        shared(move |_: &World, _: &Inner| {
            log.borrow_mut().push("inner");
        })
    };
    let outer_receiver = {
        let log = log.clone();

        shared(move |world: &World, _: &Outer| {
            log.borrow_mut().push("outer");
            world.emit(Inner);
        })
    };

    world.subscribe::<Outer, _>(&outer_receiver);
    world.subscribe::<Inner, _>(&inner_receiver);

    world.emit(Outer);

    assert_eq!(*log.borrow(), ["outer", "inner"]);
}

#[test]
#[should_panic]
fn a_receiver_reentering_itself_panics() {
    struct Tick;

    let mut world = World::new();

    let receiver = shared(move |world: &World, _: &Tick| {
        // re-enters this same receiver while it is borrowed
        world.emit(Tick);
    });

    world.subscribe::<Tick, _>(&receiver);
    world.emit(Tick);
}

#[test]
fn user_events_reach_subscribers() {
    struct Damage {
        entity: Entity,
        amount: i32,
    }

    let total = Rc::new(Cell::new(0));
    let mut world = World::new();
    let entity = world.spawn();

    let receiver = {
        let total = total.clone();

        shared(move |world: &World, event: &Damage| {
            assert!(world.contains(event.entity));
            total.set(total.get() + event.amount);
        })
    };

    world.subscribe::<Damage, _>(&receiver);
    world.emit(Damage { entity, amount: 3 });
    world.emit(Damage { entity, amount: 4 });

    assert_eq!(total.get(), 7);
}
