//! End-to-end tests: preprocessing, batch and stream detection, severity
//! mapping, artifact persistence, session logs and run history.

use flowsentry::{
    capture::{FlowTracker, PacketMeta},
    config::ServiceConfig,
    model::{self, Classifier, ScriptedClassifier, SeededClassifier},
    pipeline::DetectionContext,
    preprocess::{self, ArtifactBundle, RecordTable},
    severity::Severity,
    storage::{HistoryStore, SessionStore},
    Error,
};
use ndarray::Array3;
use std::path::Path;
use std::time::Duration;

const TRAIN_CSV: &str = "\
duration,protocol_type,service,flag,src_bytes,class
0,tcp,http,SF,100,normal
10,udp,domain_u,S0,2000,dos
5,tcp,ftp,REJ,50,probe
2,icmp,eco_i,SF,0,r2l
8,tcp,telnet,RSTO,500,u2r
";

fn fitted_bundle() -> ArtifactBundle {
    let table = RecordTable::from_reader(TRAIN_CSV.as_bytes()).unwrap();
    preprocess::fit(&table, "class").unwrap().bundle
}

fn input_table(rows: usize) -> RecordTable {
    let headers = ["duration", "protocol_type", "service", "flag", "src_bytes"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows = (0..rows)
        .map(|i| {
            vec![
                i.to_string(),
                "tcp".to_string(),
                "http".to_string(),
                "SF".to_string(),
                (100 * (i + 1)).to_string(),
            ]
        })
        .collect();
    RecordTable::from_records(headers, rows).unwrap()
}

// Classes sort as [dos, normal, probe, r2l, u2r]; each script row peaks on
// one class: normal, then dos, then probe.
fn scenario_context() -> DetectionContext {
    let script = vec![
        vec![0.03, 0.91, 0.02, 0.02, 0.02],
        vec![0.77, 0.10, 0.05, 0.04, 0.04],
        vec![0.20, 0.15, 0.55, 0.05, 0.05],
    ];
    DetectionContext::new(fitted_bundle(), Box::new(ScriptedClassifier::new(script)))
}

#[test]
fn severity_mapping_is_total_and_case_insensitive() {
    assert_eq!(Severity::of_label("normal"), Severity::Low);
    assert_eq!(Severity::of_label("probe"), Severity::Medium);
    assert_eq!(Severity::of_label("dos"), Severity::High);
    assert_eq!(Severity::of_label("r2l"), Severity::High);
    assert_eq!(Severity::of_label("u2r"), Severity::High);
    assert_eq!(Severity::of_label("DOS"), Severity::of_label("dos"));
    assert_eq!(Severity::of_label("  Normal "), Severity::Low);
    assert_eq!(Severity::of_label("mystery_attack"), Severity::Medium);
    assert_eq!(Severity::of_label(""), Severity::Medium);
}

#[test]
fn decide_breaks_ties_toward_lowest_index() {
    assert_eq!(model::decide(&[0.3, 0.5, 0.5]), (1, 0.5));
    assert_eq!(model::decide(&[0.25, 0.25, 0.25, 0.25]), (0, 0.25));
}

#[test]
fn batch_scenario_three_rows() {
    let ctx = scenario_context();
    let scored = ctx.detect_batch(&input_table(3)).unwrap();

    let attack = scored.column_index("predicted_attack").unwrap();
    let conf = scored.column_index("confidence").unwrap();
    let sev = scored.column_index("severity").unwrap();

    let rows = scored.rows();
    assert_eq!(rows[0][attack], "normal");
    assert_eq!(rows[1][attack], "dos");
    assert_eq!(rows[2][attack], "probe");
    assert_eq!(rows[0][conf], "0.91");
    assert_eq!(rows[1][conf], "0.77");
    assert_eq!(rows[2][conf], "0.55");
    assert_eq!(rows[0][sev], "Low");
    assert_eq!(rows[1][sev], "High");
    assert_eq!(rows[2][sev], "Medium");
}

#[test]
fn batch_is_deterministic() {
    let ctx = scenario_context();
    let table = input_table(3);
    let first = ctx.detect_batch(&table).unwrap();
    let second = ctx.detect_batch(&table).unwrap();
    assert_eq!(first.rows(), second.rows());
}

#[test]
fn confidence_rounds_to_three_decimals() {
    let script = vec![vec![0.123_456, 0.876_544, 0.0, 0.0, 0.0]];
    let ctx = DetectionContext::new(fitted_bundle(), Box::new(ScriptedClassifier::new(script)));
    let results: Vec<_> = ctx
        .detect_stream(&input_table(1), Duration::ZERO)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(results[0].confidence, 0.877);
    assert!(results[0].confidence >= 0.0 && results[0].confidence <= 1.0);
}

#[test]
fn empty_table_is_a_data_format_error() {
    let err = RecordTable::from_reader("duration,protocol_type\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::DataFormat(_)));
}

#[test]
fn transform_ignores_source_column_order() {
    let bundle = fitted_bundle();

    let a = RecordTable::from_reader(
        "duration,protocol_type,service,flag,src_bytes\n3,tcp,http,SF,120\n".as_bytes(),
    )
    .unwrap();
    let b = RecordTable::from_reader(
        "src_bytes,flag,duration,service,protocol_type\n120,SF,3,http,tcp\n".as_bytes(),
    )
    .unwrap();

    let ma = preprocess::transform(&a, &bundle).unwrap();
    let mb = preprocess::transform(&b, &bundle).unwrap();
    assert_eq!(ma, mb);
}

#[test]
fn transform_zero_fills_missing_and_drops_label() {
    let bundle = fitted_bundle();
    // src_bytes absent, label present, extra column unknown to the bundle
    let table = RecordTable::from_reader(
        "duration,protocol_type,service,flag,class,operator_note\n1,udp,domain_u,S0,dos,checked\n"
            .as_bytes(),
    )
    .unwrap();
    let m = preprocess::transform(&table, &bundle).unwrap();
    assert_eq!(m.ncols(), bundle.columns.len());
    let src_bytes_col = bundle
        .columns
        .iter()
        .position(|c| c == "src_bytes")
        .unwrap();
    // fitted src_bytes min is 0, so a zero fill scales to 0
    assert_eq!(m[(0, src_bytes_col)], 0.0);
}

#[test]
fn non_numeric_canonical_column_aborts() {
    let bundle = fitted_bundle();
    let table = RecordTable::from_reader(
        "duration,protocol_type,service,flag,src_bytes\nlots,tcp,http,SF,10\n".as_bytes(),
    )
    .unwrap();
    let err = preprocess::transform(&table, &bundle).unwrap_err();
    assert!(matches!(err, Error::DataFormat(_)));
}

#[test]
fn stream_yields_every_row_in_order_then_ends() {
    let ctx = scenario_context();
    let mut stream = ctx.detect_stream(&input_table(5), Duration::ZERO).unwrap();
    let mut indices = Vec::new();
    for result in &mut stream {
        indices.push(result.unwrap().record_index);
    }
    assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    assert!(stream.next().is_none());
}

#[test]
fn abandoned_stream_logs_exactly_what_was_pulled() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::new(dir.path().to_path_buf());
    let path = sessions.start_session("user@example.com").unwrap();

    let ctx = scenario_context();
    let started = std::time::Instant::now();
    let delay = Duration::from_millis(40);
    for result in ctx.detect_stream(&input_table(5), delay).unwrap().take(2) {
        sessions.append(&path, &result.unwrap()).unwrap();
    }
    // one inter-record pause for two records, nothing after the consumer stops
    assert!(started.elapsed() < Duration::from_millis(120));

    let body = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "timestamp,packet,attack,severity,confidence");
    assert!(lines[1].contains(",1,normal,Low,0.91"));
    assert!(lines[2].contains(",2,dos,High,0.77"));
}

#[test]
fn classify_record_runs_the_same_path() {
    let ctx = scenario_context();
    let vector = flowsentry::FeatureVector::zeroed();
    let result = ctx.classify_record(&vector, 7).unwrap();
    assert_eq!(result.record_index, 7);
    assert_eq!(result.predicted_label, "normal");
    assert_eq!(result.severity, Severity::Low);
}

#[test]
fn artifacts_roundtrip_and_refuse_tampering() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = fitted_bundle();
    bundle.save(dir.path()).unwrap();

    let loaded = ArtifactBundle::load(dir.path()).unwrap();
    assert_eq!(loaded.columns, bundle.columns);
    assert_eq!(loaded.labels.classes(), bundle.labels.classes());

    // flip a byte in the scaler blob; the manifest digest no longer matches
    let scaler_path = dir.path().join("scaler.json");
    let mut body = std::fs::read_to_string(&scaler_path).unwrap();
    body.push(' ');
    std::fs::write(&scaler_path, body).unwrap();
    let err = ArtifactBundle::load(dir.path()).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch(_)));
}

#[test]
fn fitted_vocabulary_is_sorted_and_closed() {
    let bundle = fitted_bundle();
    assert_eq!(
        bundle.labels.classes(),
        ["dos", "normal", "probe", "r2l", "u2r"]
    );
    assert_eq!(bundle.labels.encode("probe"), Some(2));
    assert_eq!(bundle.labels.encode("worm"), None);
    assert_eq!(bundle.labels.decode(0), Some("dos"));
}

#[test]
fn session_numbering_and_deletion() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::new(dir.path().to_path_buf());
    for _ in 0..3 {
        sessions.start_session("alice").unwrap();
    }

    let listed = sessions.list_sessions("alice").unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].session_no, 3);
    assert_eq!(listed[2].session_no, 1);

    sessions
        .delete_session("alice", &listed[0].filename)
        .unwrap();
    assert_eq!(sessions.list_sessions("alice").unwrap().len(), 2);

    assert!(sessions.delete_session("alice", "../escape.csv").is_err());
    assert!(sessions.list_sessions("nobody").unwrap().is_empty());
}

#[test]
fn session_rows_read_back_typed() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::new(dir.path().to_path_buf());
    let path = sessions.start_session("bob@lab").unwrap();

    let ctx = scenario_context();
    for result in ctx.detect_stream(&input_table(3), Duration::ZERO).unwrap() {
        sessions.append(&path, &result.unwrap()).unwrap();
    }

    let filename = path.file_name().unwrap().to_string_lossy().to_string();
    let entries = sessions.read_session("bob@lab", &filename).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].packet, 2);
    assert_eq!(entries[1].attack, "dos");
    assert_eq!(entries[1].severity, Severity::High);
}

#[test]
fn history_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(&dir.path().join("history.db")).unwrap();

    store.record_run("alice", "a.csv", "batch", 120).unwrap();
    store.record_run("bob", "b.csv", "stream", 30).unwrap();

    let recent = store.recent_runs(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].user, "bob");
    assert_eq!(recent[0].detection_type, "stream");

    let alice = store.runs_for_user("alice", 10).unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].total_records, 120);

    let pruned = store.prune_before("9999-01-01T00:00:00Z").unwrap();
    assert_eq!(pruned, 2);
    assert!(store.recent_runs(10).unwrap().is_empty());
}

#[test]
fn flow_tracker_accumulates_both_directions() {
    let mut tracker = FlowTracker::new();
    let forward = PacketMeta {
        src: "10.0.0.1:4242".to_string(),
        dst: "10.0.0.2:80".to_string(),
        protocol: "tcp".to_string(),
        length: 100,
        tcp_flags: Some(0x02),
        service: Some("http".to_string()),
    };
    let reply = PacketMeta {
        src: "10.0.0.2:80".to_string(),
        dst: "10.0.0.1:4242".to_string(),
        protocol: "tcp".to_string(),
        length: 300,
        tcp_flags: Some(0x10),
        service: Some("http".to_string()),
    };

    let v1 = tracker.observe(&forward);
    assert_eq!(v1.get("protocol_type"), Some(1.0));
    assert_eq!(v1.get("src_bytes"), Some(100.0));
    // bare SYN reads as a connection attempt
    assert_eq!(v1.get("flag"), Some(flowsentry::schema::flag_code("S0")));

    let v2 = tracker.observe(&reply);
    assert_eq!(v2.get("src_bytes"), Some(100.0));
    assert_eq!(v2.get("dst_bytes"), Some(300.0));
    assert_eq!(tracker.packet_count(), 2);
}

#[test]
fn seeded_classifier_is_reproducible() {
    let input = Array3::<f32>::zeros((4, 1, 5));
    let a = SeededClassifier::new(5, 7).predict(input.view()).unwrap();
    let b = SeededClassifier::new(5, 7).predict(input.view()).unwrap();
    assert_eq!(a, b);
    for row in a.rows() {
        let sum: f32 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }
}

#[test]
fn config_load_falls_back_to_defaults() {
    let config = ServiceConfig::load(Path::new("nonexistent.json"));
    assert_eq!(config.streaming.delay_ms, 1000);
    assert_eq!(config.log.level, "info");
    assert!(config.capture.source.is_none());
    assert_eq!(config.stream_delay(), Duration::from_millis(1000));
}
