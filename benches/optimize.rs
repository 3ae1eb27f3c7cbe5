use criterion::{criterion_group, criterion_main, Criterion};
use solarpace::{
    algo::penalty_method::PenaltyOptions,
    optimize,
    params::ModelParams,
    route::{Route, Segment},
    simulate,
};

fn route(n: usize) -> Route {
    let segments = (0..n)
        .map(|i| {
            let slope = 0.03 * ((i as f64) * 0.7).sin();
            let radiation = 600.0 + 300.0 * ((i as f64) * 0.3).cos();
            Segment::new(10_000.0, slope, radiation)
        })
        .collect();

    Route::new(segments).unwrap()
}

fn simulate_route(c: &mut Criterion) {
    let route = route(100);
    let speeds = vec![20.0; route.len()];

    c.bench_function("simulate 100 segments", |b| {
        b.iter(|| simulate(&route, &speeds, ModelParams::default()).unwrap())
    });
}

fn optimize_short(c: &mut Criterion) {
    let route = route(5);
    let speeds = vec![20.0; route.len()];

    c.bench_function("optimize 5 segments", |b| {
        b.iter(|| {
            optimize(
                &route,
                &speeds,
                ModelParams::default(),
                PenaltyOptions::default(),
            )
            .unwrap()
        })
    });
}

fn optimize_coarse(c: &mut Criterion) {
    let route = route(20);
    let speeds = vec![20.0; route.len()];

    c.bench_function("optimize 20 segments coarse", |b| {
        b.iter(|| {
            optimize(
                &route,
                &speeds,
                ModelParams::default(),
                PenaltyOptions::coarse(),
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, simulate_route, optimize_short, optimize_coarse);
criterion_main!(benches);
