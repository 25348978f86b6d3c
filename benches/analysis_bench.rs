//! Benchmarks for the Flarewatch analysis pipeline
//!
//! Run with: cargo bench

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use flarewatch::analysis::*;
use flarewatch::storage::*;
use tempfile::tempdir;

const FOODS: [&str; 5] = ["chocolate", "coffee", "bread", "cheese", "wine"];

/// Synthetic log with a flare-up every week, preceded by short sleep
fn create_test_records(days: usize) -> RecordSet {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let mut records = RecordSet::new();

    for i in 0..days {
        let date = start + Duration::days(i as i64);
        let flare = i % 7 == 6;
        let rating = if flare { 8 } else { 2 + (i % 3) as i32 };

        records
            .symptoms
            .push(SymptomRecord::new(date, rating, rating, rating - 1));

        let hours = if i % 7 == 5 { 4.5 } else { 7.5 };
        records.sleep.push(SleepRecord::new(date, hours));

        records.diet.push(
            DietRecord::new(date, "dinner")
                .item(FOODS[i % FOODS.len()])
                .item(FOODS[(i + 2) % FOODS.len()]),
        );

        if i % 28 < 5 {
            let flow = if i % 28 < 2 { "heavy" } else { "light" };
            records
                .menstrual
                .push(MenstrualRecord::new(date, "ongoing", flow));
        }
    }

    records
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let engine = AnalysisEngine::default();

    for days in [30, 365, 3650] {
        let records = create_test_records(days);

        group.throughput(Throughput::Elements(days as u64));

        group.bench_function(format!("detect_spikes_{}", days), |b| {
            b.iter(|| detect_spikes(black_box(&records.symptoms)).unwrap())
        });

        group.bench_function(format!("trigger_report_{}", days), |b| {
            b.iter(|| engine.trigger_report(black_box(&records)).unwrap())
        });

        group.bench_function(format!("predict_flareup_{}", days), |b| {
            b.iter(|| engine.predict_flareup(black_box(&records)).unwrap())
        });
    }

    group.finish();
}

fn bench_sqlite_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("sqlite");
    let rt = tokio::runtime::Runtime::new().unwrap();

    let dir = tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("bench.db")).unwrap();
    let records = create_test_records(365);

    rt.block_on(async {
        for r in records.symptoms {
            store.insert_symptoms(r).await.unwrap();
        }
        for r in records.sleep {
            store.insert_sleep(r).await.unwrap();
        }
        for r in records.diet {
            store.insert_diet(r).await.unwrap();
        }
        for r in records.menstrual {
            store.insert_menstrual(r).await.unwrap();
        }
    });

    group.bench_function("fetch_all_365_days", |b| {
        b.iter(|| rt.block_on(store.fetch_all()).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_sqlite_fetch);
criterion_main!(benches);
