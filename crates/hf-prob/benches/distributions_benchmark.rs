use criterion::{Criterion, criterion_group, criterion_main};
use hf_prob::Prior;
use std::hint::black_box;

fn bench_scalar_distributions(c: &mut Criterion) {
    let xs: Vec<f64> = (0..10_000).map(|i| (i as f64) * 0.001 - 5.0).collect();

    let normal = Prior::normal(0.0, 1.3).unwrap();
    c.bench_function("normal_logpdf_10k", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &xs {
                acc += normal.logpdf(x).unwrap();
            }
            black_box(acc)
        })
    });

    let ks: Vec<u64> = (0..10_000).map(|i| (i % 30) as u64).collect();
    c.bench_function("poisson_logpmf_10k", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &k in &ks {
                acc += hf_prob::poisson::logpmf(k, 3.2).unwrap();
            }
            black_box(acc)
        })
    });

    let priors = [
        Prior::normal(0.0, 1.0).unwrap(),
        Prior::normal(1.0, 0.05).unwrap(),
        Prior::flat(0.0, 10.0).unwrap(),
    ];
    c.bench_function("prior_logpdf_mixed_10k", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for (i, &x) in xs.iter().enumerate() {
                acc += priors[i % priors.len()].logpdf(x).unwrap();
            }
            black_box(acc)
        })
    });
}

criterion_group!(benches, bench_scalar_distributions);
criterion_main!(benches);
