use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use fenland_geom::{Circle, Vec2};
use fenland_sim::config::LandscapeConfig;
use fenland_sim::dynamics::GrowthDynamics;
use fenland_sim::landscape::Landscape;
use fenland_sim::patch::PatchShape;
use fenland_sim::source::ResourceSource;
use fenland_sim::types::{ResourceSpeciesId, WetMass};
use std::hint::black_box;

fn bench_landscape() -> Landscape {
    let config = LandscapeConfig {
        cells_per_axis: 64,
        ..LandscapeConfig::default()
    };
    Landscape::from_config(config).expect("default config is valid")
}

fn sedge_source(growth_rate: f64) -> ResourceSource {
    ResourceSource {
        species: ResourceSpeciesId(0),
        growth: GrowthDynamics { rate: growth_rate },
        initial_wet_density: WetMass(2.0),
        max_capacity_density: WetMass(8.0),
    }
}

fn bench_patch_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch_apply");

    // A disc spanning most of the world: interior branches adopt whole
    // subtrees without descending, so this measures the fast path.
    group.bench_function("wide_circle", |b| {
        b.iter_batched(
            bench_landscape,
            |mut landscape| {
                landscape.add_resource_patch(
                    PatchShape::Circle(Circle::new(Vec2::new(32.0, 32.0), 30.0)),
                    sedge_source(0.1),
                );
                black_box(landscape)
            },
            BatchSize::SmallInput,
        )
    });

    // A disc a few cells across: every touched branch straddles the rim
    // and recurses to the leaves, so this measures the slow path.
    group.bench_function("narrow_circle", |b| {
        b.iter_batched(
            bench_landscape,
            |mut landscape| {
                landscape.add_resource_patch(
                    PatchShape::Circle(Circle::new(Vec2::new(17.3, 41.8), 2.5)),
                    sedge_source(0.1),
                );
                black_box(landscape)
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    group.bench_function("update_64x64", |b| {
        b.iter_batched(
            || {
                let mut landscape = bench_landscape();
                landscape.add_resource_patch(
                    PatchShape::Circle(Circle::new(Vec2::new(20.0, 20.0), 12.0)),
                    sedge_source(0.15),
                );
                landscape
            },
            |mut landscape| {
                landscape.update(8);
                black_box(landscape)
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_patch_apply, bench_tick);
criterion_main!(benches);
