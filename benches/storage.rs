//! Storage benchmark: run history inserts and session log appends.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flowsentry::pipeline::PredictionResult;
use flowsentry::severity::Severity;
use flowsentry::storage::{HistoryStore, SessionStore};
use tempfile::tempdir;

fn bench_record_run(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(&dir.path().join("history.db")).unwrap();

    c.bench_function("history_record_run", |b| {
        b.iter(|| black_box(store.record_run("bench", "input.csv", "batch", 1000)).unwrap())
    });
}

fn bench_recent_runs(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(&dir.path().join("history.db")).unwrap();
    for _ in 0..100 {
        store.record_run("bench", "input.csv", "stream", 50).unwrap();
    }

    c.bench_function("history_recent_runs", |b| {
        b.iter(|| black_box(store.recent_runs(10)).unwrap())
    });
}

fn bench_session_append(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let sessions = SessionStore::new(dir.path().to_path_buf());
    let path = sessions.start_session("bench").unwrap();
    let result = PredictionResult {
        record_index: 1,
        predicted_label: "dos".to_string(),
        confidence: 0.91,
        severity: Severity::High,
    };

    c.bench_function("session_append_row", |b| {
        b.iter(|| sessions.append(black_box(&path), &result).unwrap())
    });
}

criterion_group!(
    benches,
    bench_record_run,
    bench_recent_runs,
    bench_session_append
);
criterion_main!(benches);
