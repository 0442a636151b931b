use criterion::{black_box, criterion_group, criterion_main, Criterion};

use skillfuzz_core::model::MistakeHistogram;
use skillfuzz_core::pipeline::{QuizPipeline, QuizTotals, TopicPipeline};
use skillfuzz_core::CrispValues;

fn bench_topic(c: &mut Criterion) {
    let mut group = c.benchmark_group("topic");
    let pipeline = TopicPipeline::builtin().unwrap();

    let inputs = CrispValues::from([("raw_score".to_string(), 40.0), ("penalty".to_string(), 6.0)]);
    group.bench_function("compute", |b| {
        b.iter(|| pipeline.system().compute(black_box(&inputs)))
    });

    group.bench_function("assess_topic", |b| {
        b.iter(|| {
            pipeline.assess_topic(
                "algebra",
                black_box(40.0),
                black_box(MistakeHistogram::new(0, 0, 1)),
            )
        })
    });

    group.finish();
}

fn bench_quiz(c: &mut Criterion) {
    let mut group = c.benchmark_group("quiz");
    let pipeline = QuizPipeline::builtin().unwrap();
    let totals = QuizTotals {
        total_score: 260.0,
        total_time: 500.0,
    };

    group.bench_function("assess_topic", |b| {
        b.iter(|| pipeline.assess_topic("algebra", black_box(60.0), black_box(totals)))
    });

    group.bench_function("aggregate", |b| {
        let inputs = CrispValues::from([
            ("raw_score".to_string(), 60.0),
            ("total_score".to_string(), 260.0),
            ("total_time".to_string(), 500.0),
        ]);
        b.iter(|| pipeline.system().aggregate("adjusted_score", black_box(&inputs)))
    });

    group.finish();
}

criterion_group!(benches, bench_topic, bench_quiz);
criterion_main!(benches);
