use criterion::{black_box, criterion_group, criterion_main, Criterion};
use labor_rate_engine::{
    generate_curve, CurveDomain, FieldValue, PricingConfig, PricingEngine, RateMatrix,
    RawPricingConfig, ScalingMode, StoreBook, ValidationPolicy,
};

fn bench_evaluate(c: &mut Criterion) {
    let infinity = PricingConfig::infinity(150.0, 2.0);
    let tapered = infinity.capped_at_rate(ScalingMode::Proportional { end_hours: Some(18.0) }, 170.0);

    c.bench_function("evaluate_infinity", |b| {
        b.iter(|| black_box(PricingEngine::evaluate(black_box(12.3), &infinity)));
    });
    c.bench_function("evaluate_proportional_rate_cap", |b| {
        b.iter(|| black_box(PricingEngine::evaluate(black_box(12.3), &tapered)));
    });
}

fn bench_curve(c: &mut Criterion) {
    let config = PricingConfig::infinity(150.0, 2.0).capped_at_hours(ScalingMode::Mirror, 6.0);

    c.bench_function("generate_curve_matrix_domain", |b| {
        b.iter(|| {
            let total: f64 = generate_curve(&config, CurveDomain::matrix(20))
                .map(|sample| sample.total_amount)
                .sum();
            black_box(total)
        });
    });
    c.bench_function("rate_matrix_build", |b| {
        b.iter(|| black_box(RateMatrix::build(&config, 20)));
    });
}

fn bench_quote_all(c: &mut Criterion) {
    let mut book = StoreBook::new(ValidationPolicy::Strict, 150.0);
    for store in 0..64 {
        let raw = RawPricingConfig {
            base_rate: Some(FieldValue::Number(100.0 + store as f64)),
            percent_increase_per_hour: Some(FieldValue::Number(1.5)),
            ..Default::default()
        };
        book.insert(&format!("store-{store:02}"), raw).unwrap();
    }

    c.bench_function("quote_all_64_stores", |b| {
        b.iter(|| black_box(book.quote_all(black_box(7.5)).unwrap()));
    });
}

criterion_group!(benches, bench_evaluate, bench_curve, bench_quote_all);
criterion_main!(benches);
