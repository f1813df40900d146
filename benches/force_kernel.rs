use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use starmesh::kernel::{accumulate_forces, reset_forces};
use starmesh::SimConstants;

pub fn bench_pairwise_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairwise_kernel");
    group.measurement_time(std::time::Duration::from_secs(5));
    group.sample_size(50);
    let constants = SimConstants::default();

    for &count in &[64usize, 512, 2048] {
        let mut rng = StdRng::seed_from_u64(9);
        let rx: Vec<f64> = (0..count).map(|_| rng.gen_range(-1000.0..1000.0)).collect();
        let ry: Vec<f64> = (0..count).map(|_| rng.gen_range(-1000.0..1000.0)).collect();
        let m: Vec<f64> = (0..count).map(|_| rng.gen_range(1.0e12..1.0e15)).collect();
        let mut fx = vec![0.0; count];
        let mut fy = vec![0.0; count];

        group.bench_function(format!("bodies_{}", count), |b| {
            b.iter(|| {
                reset_forces(&mut fx, &mut fy);
                accumulate_forces(&rx, &ry, &m, &mut fx, &mut fy, &constants);
            })
        });
    }
}

criterion_group!(benches, bench_pairwise_kernel);
criterion_main!(benches);
