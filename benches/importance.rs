use claimlens::data::{Column, Frame, Schema};
use claimlens::explain::{Explainer, Loss, PermutationImportance};
use claimlens::model::{PoissonGlm, Predictor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use rand::prelude::*;
use std::sync::Arc;

fn create_claims_explainer(n_rows: usize) -> Explainer {
    let mut rng = StdRng::seed_from_u64(42);

    let car_age: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(0.0..20.0)).collect();
    let driver_age: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(18.0..80.0)).collect();
    let fuel: Vec<String> = (0..n_rows)
        .map(|_| {
            if rng.gen_bool(0.5) {
                "Diesel".to_string()
            } else {
                "Regular".to_string()
            }
        })
        .collect();
    let exposure: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(0.05..1.0)).collect();
    let labels: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(0..3) as f64).collect();

    let schema = Schema::new("ClaimNb", "Exposure")
        .with_numeric("CarAge")
        .with_numeric("DriverAge")
        .with_categorical("Fuel");
    let data = Frame::new(vec![
        ("CarAge".to_string(), Column::Numeric(car_age)),
        ("DriverAge".to_string(), Column::Numeric(driver_age)),
        ("Fuel".to_string(), Column::Categorical(fuel)),
        ("Exposure".to_string(), Column::Numeric(exposure)),
    ])
    .unwrap();

    let glm = PoissonGlm::new(-2.0)
        .with_numeric("CarAge", 0.03)
        .with_numeric("DriverAge", -0.008)
        .with_level("Fuel", "Diesel", 0.15);

    Explainer::new(
        Predictor::Glm(glm),
        schema,
        Arc::new(data),
        Arc::new(Array1::from_vec(labels)),
        "frequency glm",
    )
    .unwrap()
}

fn bench_importance(c: &mut Criterion) {
    let mut group = c.benchmark_group("permutation_importance");
    group.sample_size(10);

    for n_rows in [1_000, 5_000, 20_000].iter() {
        let explainer = create_claims_explainer(*n_rows);

        group.bench_with_input(
            BenchmarkId::new("compute", n_rows),
            &explainer,
            |b, explainer| {
                b.iter(|| {
                    PermutationImportance::new(Loss::PoissonDeviance)
                        .with_n_repeats(5)
                        .with_seed(7)
                        .compute(black_box(explainer))
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_importance);
criterion_main!(benches);
