use std::hint::black_box;

use aircode::dataset::FeatureRecord;
use aircode::ml::{Evaluator, NoProgress, PipelineBuilder, TrainedModel};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const EVAL_ROWS: usize = 2_000;

fn records(count: usize, offset: usize) -> Vec<FeatureRecord> {
    const FLEET: [(&str, &str); 6] = [
        ("B738", "737"),
        ("QF73H", "737"),
        ("A320", "320"),
        ("JQ320", "320"),
        ("B788", "788"),
        ("NZ788", "788"),
    ];
    (0..count)
        .map(|idx| {
            let (prefix, label) = FLEET[idx % FLEET.len()];
            FeatureRecord::new(format!("{prefix}-{:04}", offset + idx), label)
        })
        .collect()
}

fn trained_model() -> TrainedModel {
    PipelineBuilder::default()
        .build()
        .fit(&records(600, 0))
        .expect("fit bench model")
}

fn bench_predict(c: &mut Criterion) {
    let model = trained_model();
    c.bench_function("predict_single", |b| {
        b.iter(|| model.predict(black_box("B738-9123")).expect("predict"))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let model = trained_model();
    let rows = records(EVAL_ROWS, 5_000);
    let evaluator = Evaluator::new(&model);
    c.bench_with_input(
        BenchmarkId::new("evaluate_sequential", EVAL_ROWS),
        &rows,
        |b, rows| {
            b.iter(|| {
                evaluator
                    .evaluate(rows.iter().cloned(), &mut NoProgress)
                    .expect("evaluate")
            })
        },
    );
    for workers in [2, 4] {
        c.bench_with_input(
            BenchmarkId::new("evaluate_parallel", workers),
            &rows,
            |b, rows| {
                b.iter(|| {
                    evaluator
                        .evaluate_parallel(rows, workers)
                        .expect("evaluate")
                })
            },
        );
    }
}

criterion_group!(benches, bench_predict, bench_evaluate);
criterion_main!(benches);
