//! Criterion benchmarks for nutriplan_core optimization
//!
//! Run with: cargo bench -p nutriplan_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nutriplan_core::model::{Nutrient, Objective, OptimizationRequest, RequestBuilder, ResponsePath};
use nutriplan_core::optimizer::{GlobalConfig, LocalConfig, SolverConfig};
use nutriplan_core::{Engine, EngineConfig};

fn create_corn_request() -> OptimizationRequest {
    RequestBuilder::new("bench-field", "corn")
        .sampled(jiff::civil::date(2026, 3, 14))
        .target_yield(180.0)
        .soil_ph(6.5)
        .organic_matter(3.2)
        .soil_test(Nutrient::Nitrogen, 25.0)
        .soil_test(Nutrient::Phosphorus, 15.0)
        .soil_test(Nutrient::Potassium, 120.0)
        .requirement(Nutrient::Nitrogen, 100.0, (120.0, 180.0), 0.65)
        .requirement(Nutrient::Phosphorus, 30.0, (40.0, 80.0), 0.25)
        .requirement(Nutrient::Potassium, 80.0, (100.0, 150.0), 0.60)
        .limit(Nutrient::Nitrogen, 200.0)
        .limit(Nutrient::Phosphorus, 100.0)
        .limit(Nutrient::Potassium, 200.0)
        .budget(150.0)
        .objective(Objective::Balanced)
        .build()
}

fn create_spectrum_request(nutrient_count: usize) -> OptimizationRequest {
    let mut builder = RequestBuilder::new("bench-spectrum", "corn")
        .sampled(jiff::civil::date(2026, 3, 14))
        .target_yield(180.0)
        .soil_ph(6.5)
        .organic_matter(3.2)
        .budget(250.0);
    for nutrient in Nutrient::ALL.into_iter().take(nutrient_count) {
        builder = builder
            .soil_test(nutrient, 20.0)
            .simple_requirement(nutrient, (40.0, 90.0));
    }
    builder.build()
}

fn global_only_engine() -> Engine {
    Engine::new(EngineConfig {
        solver: SolverConfig {
            local: LocalConfig {
                max_iterations: 0,
                ..LocalConfig::default()
            },
            global: GlobalConfig::default(),
            ..SolverConfig::default()
        },
        ..EngineConfig::default()
    })
}

fn bench_closed_form_optimize(c: &mut Criterion) {
    let engine = Engine::default();
    let request = create_corn_request();

    c.bench_function("closed_form_corn", |b| {
        b.iter(|| engine.optimize(black_box(&request)))
    });
}

fn bench_global_stage(c: &mut Criterion) {
    let engine = global_only_engine();
    let request = create_corn_request();

    c.bench_function("differential_evolution_corn", |b| {
        b.iter(|| engine.optimize(black_box(&request)))
    });
}

fn bench_surrogate_path(c: &mut Criterion) {
    let engine = Engine::default();
    let mut request = create_corn_request();
    request.response_path = ResponsePath::Surrogate;

    c.bench_function("surrogate_corn", |b| {
        b.iter(|| engine.optimize(black_box(&request)))
    });
}

fn bench_nutrient_spectrum(c: &mut Criterion) {
    let mut group = c.benchmark_group("nutrient_spectrum");
    let engine = Engine::default();

    for count in [3, 6, 12].iter() {
        let request = create_spectrum_request(*count);
        group.bench_with_input(BenchmarkId::new("nutrients", count), count, |b, _| {
            b.iter(|| engine.optimize(black_box(&request)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_closed_form_optimize,
    bench_global_stage,
    bench_surrogate_path,
    bench_nutrient_spectrum,
);
criterion_main!(benches);
