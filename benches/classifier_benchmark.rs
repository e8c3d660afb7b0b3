use criterion::{black_box, criterion_group, criterion_main, Criterion};
use labelkit::metrics::macro_f1;
use labelkit::{KnnClassifier, MultiLabelClassifier, OneVsRestClassifier};
use ndarray::Array1;
use std::collections::HashSet;

const DIM: usize = 64;

/// Deterministic pseudo-random vectors, clustered per class so predictions
/// stay meaningful. No model download needed.
fn synthetic_vector(class: usize, seed: usize) -> Array1<f32> {
    let mut values = vec![0.0f32; DIM];
    let mut state = (seed as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    for (i, value) in values.iter_mut().enumerate() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let noise = ((state >> 33) as f32 / u32::MAX as f32) * 0.2;
        *value = if i % 8 == class % 8 { 1.0 + noise } else { noise };
    }
    Array1::from_vec(values)
}

fn synthetic_training(n: usize) -> (Vec<Array1<f32>>, Vec<HashSet<String>>) {
    let vectors: Vec<Array1<f32>> = (0..n).map(|i| synthetic_vector(i % 4, i)).collect();
    let labels: Vec<HashSet<String>> = (0..n)
        .map(|i| HashSet::from([format!("class_{}", i % 4)]))
        .collect();
    (vectors, labels)
}

fn bench_knn_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("KnnPrediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for &size in &[100usize, 500, 2000] {
        let (vectors, labels) = synthetic_training(size);
        let mut classifier = KnnClassifier::new(5);
        classifier.fit(&vectors, &labels).unwrap();
        let query = vec![synthetic_vector(1, 31337)];

        group.bench_function(format!("train_size_{}", size), |b| {
            b.iter(|| classifier.predict(black_box(&query), None).unwrap())
        });
    }

    group.finish();
}

fn bench_one_vs_rest(c: &mut Criterion) {
    let mut group = c.benchmark_group("OneVsRest");
    group.sample_size(20);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let (vectors, labels) = synthetic_training(200);

    group.bench_function("fit_200x4", |b| {
        b.iter(|| {
            let mut classifier = OneVsRestClassifier::new(0.5).with_max_iter(100);
            classifier
                .fit(black_box(&vectors), black_box(&labels))
                .unwrap()
        })
    });

    let mut classifier = OneVsRestClassifier::new(0.5);
    classifier.fit(&vectors, &labels).unwrap();
    let queries: Vec<Array1<f32>> = (0..50).map(|i| synthetic_vector(i % 4, i + 999)).collect();

    group.bench_function("predict_batch_50", |b| {
        b.iter(|| classifier.predict(black_box(&queries), None).unwrap())
    });

    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("Metrics");
    group.sample_size(50);

    let (_, labels) = synthetic_training(1000);
    let predictions = labels.clone();
    let all_labels: Vec<String> = (0..4).map(|i| format!("class_{}", i)).collect();

    group.bench_function("macro_f1_1000_items", |b| {
        b.iter(|| {
            macro_f1(
                black_box(&labels),
                black_box(&predictions),
                black_box(&all_labels),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_knn_prediction, bench_one_vs_rest, bench_metrics);
criterion_main!(benches);
