use criterion::{Criterion, criterion_group, criterion_main};
use hf_translate::pyhf::{Workspace, build_pyhf, loglikelihood_with_priors, simplemodels};
use std::hint::black_box;

fn load_complex_workspace() -> Workspace {
    let json = include_str!("../../../tests/fixtures/complex_workspace.json");
    Workspace::from_json_str(json).unwrap()
}

fn benchmark_build(c: &mut Criterion) {
    let workspace = load_complex_workspace();

    c.bench_function("build_complex_workspace", |b| {
        b.iter(|| black_box(build_pyhf(black_box(&workspace)).unwrap()))
    });
}

fn benchmark_expected(c: &mut Criterion) {
    let workspace = load_complex_workspace();
    let model = build_pyhf(&workspace).unwrap();
    let params = model.inits();

    c.bench_function("expected_complex_workspace", |b| {
        b.iter(|| {
            let expected = model.expected().eval(black_box(&params)).unwrap();
            black_box(expected)
        })
    });

    let n = 200;
    let signal: Vec<f64> = (0..n).map(|i| 1.0 + (i % 7) as f64).collect();
    let bkg: Vec<f64> = (0..n).map(|i| 50.0 + (i % 13) as f64).collect();
    let unc: Vec<f64> = bkg.iter().map(|b| 0.1 * b).collect();
    let wide = build_pyhf(&simplemodels::uncorrelated_background(&signal, &bkg, &unc).unwrap()).unwrap();
    let wide_params = wide.inits();

    c.bench_function("expected_200_bins_shapesys", |b| {
        b.iter(|| black_box(wide.expected().eval(black_box(&wide_params)).unwrap()))
    });
}

fn benchmark_loglikelihood(c: &mut Criterion) {
    let workspace = load_complex_workspace();
    let model = build_pyhf(&workspace).unwrap();
    let observed = model.observed(&workspace).unwrap();
    let ll = loglikelihood_with_priors(model.expected().clone(), &observed, &model.priors()).unwrap();
    let params = model.inits();

    c.bench_function("loglikelihood_complex_workspace", |b| {
        b.iter(|| black_box(ll.eval(black_box(&params)).unwrap()))
    });

    c.bench_function("gradient_complex_workspace", |b| {
        b.iter(|| black_box(ll.gradient(black_box(&params)).unwrap()))
    });
}

criterion_group!(benches, benchmark_build, benchmark_expected, benchmark_loglikelihood);
criterion_main!(benches);
