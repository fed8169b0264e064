//! Inference benchmark: single-step sequence input → softmax verdicts.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flowsentry::model::{self, Classifier, SeededClassifier};
use ndarray::Array3;

fn bench_predict_single_record(c: &mut Criterion) {
    let classifier = SeededClassifier::new(5, 42);
    let input = Array3::<f32>::zeros((1, 1, 41));

    c.bench_function("predict_single_record", |b| {
        b.iter(|| classifier.predict(black_box(input.view())).unwrap())
    });
}

fn bench_predict_by_batch(c: &mut Criterion) {
    let classifier = SeededClassifier::new(5, 42);

    let mut g = c.benchmark_group("predict_by_batch");
    for batch in [1, 16, 128, 1024] {
        let input = Array3::<f32>::zeros((batch, 1, 41));
        g.bench_function(format!("batch_{}", batch).as_str(), |b| {
            b.iter(|| classifier.predict(black_box(input.view())).unwrap())
        });
    }
    g.finish();
}

fn bench_decide(c: &mut Criterion) {
    let row = vec![0.02f32, 0.91, 0.03, 0.02, 0.02];

    c.bench_function("decide_softmax_row", |b| {
        b.iter(|| model::decide(black_box(&row)))
    });
}

criterion_group!(
    benches,
    bench_predict_single_record,
    bench_predict_by_batch,
    bench_decide
);
criterion_main!(benches);
