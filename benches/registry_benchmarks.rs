use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use glam::Vec3;

use scene_registry::registry::Registry;
use scene_registry::scene::{Light, Transform};
use scene_registry::{RegistryConfig, World};

// ---------------------------------------------------------------------------
// Creation and naming
// ---------------------------------------------------------------------------

fn bench_create_1k(c: &mut Criterion) {
    let names: Vec<String> = (0..1_000).map(|i| format!("light{i}")).collect();
    c.bench_function("create_1k_named", |b| {
        b.iter_batched(
            || Registry::<Light>::new(1_000),
            |lights| {
                for name in &names {
                    black_box(lights.create(name).unwrap());
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_create_unique_collisions(c: &mut Criterion) {
    c.bench_function("create_unique_256_same_base", |b| {
        b.iter_batched(
            || Registry::<Light>::new(256),
            |lights| {
                for _ in 0..256 {
                    black_box(lights.create_unique("lamp").unwrap());
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_remove_and_reuse(c: &mut Criterion) {
    c.bench_function("remove_reuse_1k", |b| {
        b.iter_batched(
            || {
                let lights = Registry::<Light>::new(1_000);
                for i in 0..1_000 {
                    lights.create(&format!("l{i}")).unwrap();
                }
                for i in (0..1_000).step_by(2) {
                    lights.remove_id(i);
                }
                lights
            },
            |lights| {
                // Refill the freed slots
                for i in 0..500 {
                    black_box(lights.create(&format!("n{i}")).unwrap());
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_lookup_by_name_10k(c: &mut Criterion) {
    let lights = Registry::<Light>::new(10_000);
    let names: Vec<String> = (0..10_000).map(|i| format!("light{i}")).collect();
    for name in &names {
        lights.create(name).unwrap();
    }
    c.bench_function("lookup_by_name_10k", |b| {
        b.iter(|| {
            for name in &names {
                black_box(lights.get(name));
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Synchronization
// ---------------------------------------------------------------------------

fn bench_update_all_sparse_dirty(c: &mut Criterion) {
    let lights = Registry::<Light>::new(4_096);
    let handles: Vec<_> = (0..4_096)
        .map(|i| lights.create(&format!("l{i}")).unwrap())
        .collect();
    lights.update_all();

    c.bench_function("update_all_64_of_4k_dirty", |b| {
        b.iter(|| {
            for handle in handles.iter().step_by(64) {
                lights.write(*handle, |l| l.set_intensity(2.0));
            }
            lights.update_all();
        });
    });
}

fn bench_transform_chain_propagation(c: &mut Criterion) {
    let world = World::new(&RegistryConfig::uniform(1_024));
    let chain: Vec<_> = (0..1_024)
        .map(|i| world.transforms.create(&format!("t{i}")).unwrap())
        .collect();
    for pair in chain.windows(2) {
        world.transforms.set_parent(pair[1], pair[0]).unwrap();
    }
    world.update_all();

    c.bench_function("move_root_of_1k_chain", |b| {
        b.iter(|| {
            world
                .transforms
                .write(chain[0], |t: &mut Transform| t.add_position(Vec3::X));
            world.transforms.update_all();
        });
    });
}

criterion_group!(
    benches,
    bench_create_1k,
    bench_create_unique_collisions,
    bench_remove_and_reuse,
    bench_lookup_by_name_10k,
    bench_update_all_sparse_dirty,
    bench_transform_chain_propagation,
);
criterion_main!(benches);
