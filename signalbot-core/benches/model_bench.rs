//! Criterion benchmarks for signal-model hot paths.
//!
//! Benchmarks:
//! 1. Indicator engine (annotate a daily series)
//! 2. Forest fit on a prepared feature matrix
//! 3. Batch prediction over every complete row

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use signalbot_core::data::{Period, QuoteSource, RangeSpec, SyntheticSource};
use signalbot_core::domain::Series;
use signalbot_core::features::FeatureFrame;
use signalbot_core::model::{ModelConfig, SignalModel, SignalPredictor};
use signalbot_core::schema::default_columns;

fn history(period: Period) -> Series {
    let anchor = NaiveDate::from_ymd_opt(2024, 6, 14)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    SyntheticSource::anchored(anchor)
        .fetch_series("BENCH", RangeSpec::Period(period))
        .unwrap()
}

fn bench_annotate(c: &mut Criterion) {
    let mut group = c.benchmark_group("annotate");
    for period in [Period::TwoYears, Period::FiveYears] {
        let series = history(period);
        group.bench_with_input(
            BenchmarkId::from_parameter(period),
            &series,
            |b, series| b.iter(|| FeatureFrame::annotate(black_box(series.clone()))),
        );
    }
    group.finish();
}

fn bench_train(c: &mut Criterion) {
    let frame = FeatureFrame::annotate(history(Period::TwoYears));
    let mut group = c.benchmark_group("train");
    group.sample_size(10);
    for n_trees in [10, 100] {
        let mut config = ModelConfig::default();
        config.forest.n_trees = n_trees;
        group.bench_with_input(BenchmarkId::from_parameter(n_trees), &config, |b, config| {
            b.iter(|| {
                let mut model = SignalModel::new(config.clone());
                model.train(black_box(&frame)).unwrap()
            })
        });
    }
    group.finish();
}

fn bench_predict_rows(c: &mut Criterion) {
    let frame = FeatureFrame::annotate(history(Period::FiveYears));
    let mut model = SignalModel::default();
    model.train(&frame).unwrap();
    let columns = default_columns();
    let rows: Vec<Vec<f64>> = frame
        .complete_rows(&columns)
        .into_iter()
        .filter_map(|i| frame.row(i, &columns))
        .collect();

    c.bench_function("predict_rows_5y", |b| {
        b.iter(|| model.predict_rows(black_box(&rows)).unwrap())
    });
}

criterion_group!(benches, bench_annotate, bench_train, bench_predict_rows);
criterion_main!(benches);
