use std::collections::HashSet;
use std::sync::Arc;

use glam::Vec3;
use scene_registry::registry::{Registry, RegistryError};
use scene_registry::resources::Material;
use scene_registry::scene::{HierarchyError, Light, Transform};
use scene_registry::sync::SyncSink;
use scene_registry::{ComponentKind, RegistryConfig, SyncView, World};

/// Small deterministic generator so create/remove sequences are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

// ---------------------------------------------------------------------------
// Identity and naming
// ---------------------------------------------------------------------------

#[test]
fn names_stay_unique_across_random_create_remove() {
    let lights = Registry::<Light>::new(16);
    let mut rng = Lcg(7);

    for _ in 0..2000 {
        let name = format!("light{}", rng.next() % 24);
        if rng.next() % 3 == 0 {
            lights.remove(&name);
        } else {
            match lights.create(&name) {
                Ok(_) => {}
                Err(RegistryError::DuplicateName { .. }) => assert!(lights.contains(&name)),
                Err(RegistryError::CapacityExceeded { .. }) => assert_eq!(lights.count(), 16),
                Err(err) => panic!("unexpected error: {err}"),
            }
        }

        let names = lights.names();
        let distinct: HashSet<&String> = names.iter().collect();
        assert_eq!(distinct.len(), names.len());
        assert_eq!(names.len(), lights.count());
        assert!(lights.count() <= lights.capacity());

        // Every live name resolves to a distinct live id.
        let ids: HashSet<u32> = names
            .iter()
            .map(|n| lights.get(n).expect("live name resolves").id())
            .collect();
        assert_eq!(ids.len(), names.len());
    }
}

#[test]
fn removed_id_is_not_found_and_reuse_starts_clean() {
    let materials = Registry::<Material>::new(4);
    let handle = materials.create("paint").unwrap();
    materials.write(handle, |m| m.set_base_color(Vec3::X));

    assert!(materials.remove_id(handle.id()));
    assert!(materials.get_id(handle.id()).is_none());
    assert!(materials.get("paint").is_none());

    let reused = materials.create("other").unwrap();
    assert_eq!(reused.id(), handle.id());
    assert_ne!(reused, handle);
    let default_color = Material::default().base_color();
    assert_eq!(materials.read(reused, |m| m.base_color()), Some(default_color));
}

#[test]
fn creation_beyond_capacity_fails_without_side_effects() {
    let world = World::new(&RegistryConfig::uniform(8).with_max_lights(3));
    for i in 0..3 {
        world.lights.create(&format!("l{i}")).unwrap();
    }
    world.update_all();

    let err = world.lights.create("overflow").unwrap_err();
    assert_eq!(
        err,
        RegistryError::CapacityExceeded {
            kind: ComponentKind::Light,
            capacity: 3
        }
    );
    assert_eq!(world.lights.count(), 3);
    assert!(!world.lights.is_any_dirty());
    assert!(world.lights.get("overflow").is_none());
}

// ---------------------------------------------------------------------------
// Dirty tracking and synchronization
// ---------------------------------------------------------------------------

#[derive(Default)]
struct UploadCounter {
    light_bytes: usize,
    light_dirty: Vec<u32>,
    transform_dirty: Vec<u32>,
}

impl SyncSink for UploadCounter {
    fn lights(&mut self, view: SyncView<'_, Light>) {
        self.light_bytes = view.as_bytes().len();
        self.light_dirty = view.dirty_ids().collect();
    }

    fn transforms(&mut self, view: SyncView<'_, Transform>) {
        self.transform_dirty = view.dirty_ids().collect();
    }
}

#[test]
fn setter_marks_dirty_until_synchronized() {
    let world = World::new(&RegistryConfig::uniform(4));
    let a = world.lights.create("a").unwrap();
    let b = world.lights.create("b").unwrap();
    world.update_all();
    assert!(!world.is_any_dirty());

    world.lights.write(b, |l| l.set_intensity(5.0));
    assert!(world.lights.is_dirty(b));
    assert!(!world.lights.is_dirty(a));
    assert!(world.is_dirty(ComponentKind::Light));
    assert!(!world.is_dirty(ComponentKind::Transform));

    let mut sink = UploadCounter::default();
    world.synchronize(&mut sink);
    assert_eq!(sink.light_dirty, vec![b.id()]);
    assert_eq!(sink.light_bytes, 4 * std::mem::size_of::<scene_registry::scene::LightStruct>());
    assert!(!world.is_any_dirty());
}

#[test]
fn moving_a_parent_resends_the_whole_subtree() {
    let world = World::new(&RegistryConfig::uniform(8));
    let root = world.transforms.create("root").unwrap();
    let arm = world.transforms.create("arm").unwrap();
    let hand = world.transforms.create("hand").unwrap();
    let other = world.transforms.create("other").unwrap();
    world.transforms.set_parent(arm, root).unwrap();
    world.transforms.set_parent(hand, arm).unwrap();
    world.update_all();

    world.transforms.write(root, |t| t.set_position(Vec3::Y));
    let mut sink = UploadCounter::default();
    world.synchronize(&mut sink);

    assert_eq!(sink.transform_dirty, vec![root.id(), arm.id(), hand.id()]);
    assert!(!sink.transform_dirty.contains(&other.id()));
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

#[test]
fn reverse_parenting_is_a_cycle() {
    let world = World::new(&RegistryConfig::uniform(4));
    let a = world.transforms.create("A").unwrap();
    let b = world.transforms.create("B").unwrap();

    world.transforms.set_parent(a, b).unwrap();
    let err = world.transforms.set_parent(b, a).unwrap_err();
    assert!(matches!(err, HierarchyError::Cycle { .. }));

    assert_eq!(world.transforms.parent(a), Some(b));
    assert_eq!(world.transforms.parent(b), None);
    assert_eq!(world.transforms.children(b), vec![a]);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_create_unique_never_hands_out_a_name_twice() {
    let lights = Arc::new(Registry::<Light>::new(256));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lights = Arc::clone(&lights);
            std::thread::spawn(move || {
                (0..32)
                    .map(|_| lights.create_unique("lamp").unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let created: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(created.len(), 256);
    assert_eq!(lights.count(), 256);

    let names: HashSet<String> = created
        .iter()
        .map(|h| lights.name_of(*h).unwrap())
        .collect();
    assert_eq!(names.len(), 256);
    assert!(names.contains("lamp"));
}

#[test]
fn registries_of_different_types_work_in_parallel() {
    let world = World::new(&RegistryConfig::uniform(128));

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..100 {
                let t = world.transforms.create(&format!("t{i}")).unwrap();
                world.transforms.write(t, |t| t.set_position(Vec3::splat(i as f32)));
            }
        });
        scope.spawn(|| {
            for i in 0..100 {
                let l = world.lights.create(&format!("l{i}")).unwrap();
                world.lights.write(l, |l| l.set_intensity(i as f32));
            }
        });
        scope.spawn(|| {
            for _ in 0..50 {
                world.update_all();
            }
        });
    });

    assert_eq!(world.transforms.count(), 100);
    assert_eq!(world.lights.count(), 100);
    world.update_all();
    assert!(!world.is_any_dirty());
}
