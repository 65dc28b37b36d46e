//! Benchmarks for bounded Voronoi mesh construction and rasterization.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::DVec2;
use sediment_mesh::{BoundedVoronoiMesh, ScalarImage};
use sediment_spatial::Aabb2;

/// Simple LCG random number generator for deterministic point clouds.
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn uniform_positions(count: usize, seed: u64) -> Vec<DVec2> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| {
            DVec2::new(
                0.01 + 0.98 * rng.next_f64(),
                0.01 + 0.98 * rng.next_f64(),
            )
        })
        .collect()
}

fn unit_bounds() -> Aabb2 {
    Aabb2::new(DVec2::ZERO, DVec2::ONE)
}

fn bench_mesh_construction(c: &mut Criterion) {
    let positions = uniform_positions(500, 42);
    c.bench_function("mesh_construct_500", |b| {
        b.iter(|| {
            let mesh = BoundedVoronoiMesh::new(&positions, None, unit_bounds()).unwrap();
            black_box(mesh)
        })
    });
}

fn bench_pixelize(c: &mut Criterion) {
    let positions = uniform_positions(500, 42);
    let deposit = vec![1.0; positions.len()];
    let mesh = BoundedVoronoiMesh::new(&positions, Some(&deposit), unit_bounds()).unwrap();

    c.bench_function("mesh_pixelize_500_64x64", |b| {
        b.iter(|| {
            let mut image = ScalarImage::new(64, 64);
            mesh.pixelize(&mut image);
            black_box(image)
        })
    });
}

criterion_group!(benches, bench_mesh_construction, bench_pixelize);
criterion_main!(benches);
