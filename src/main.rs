//! Flowsentry entrypoint. One binary, five modes: score a CSV in batch,
//! replay it as a paced stream, classify live packet metadata, fit
//! preprocessing artifacts from a training file, or report service status.

use flowsentry::{
    capture::{FlowTracker, PacketMeta},
    config::ServiceConfig,
    logging::StructuredLogger,
    model::OnnxClassifier,
    pipeline::DetectionContext,
    preprocess::{ArtifactBundle, RecordTable},
    storage::{HistoryStore, SessionStore},
    training,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

static STOP: AtomicBool = AtomicBool::new(false);

fn stop_requested() -> bool {
    STOP.load(Ordering::Relaxed)
}

fn install_stop_handler() {
    let _ = ctrlc::set_handler(|| {
        STOP.store(true, Ordering::Relaxed);
    });
}

fn usage() -> ! {
    eprintln!(
        "usage: flowsentry <mode>\n\
         \n\
         modes:\n\
         \x20 batch <input.csv> [output.csv]   score a file in one pass\n\
         \x20 stream <input.csv>               replay a file record by record\n\
         \x20 live [packets.csv]               classify packet metadata (stdin when omitted)\n\
         \x20 fit <train.csv> [label_column]   fit preprocessing artifacts\n\
         \x20 status                           report training state and recent runs"
    );
    std::process::exit(2);
}

fn load_context(config: &ServiceConfig) -> Result<DetectionContext, flowsentry::Error> {
    let bundle = ArtifactBundle::load(&config.artifacts.dir)?;
    let classifier = OnnxClassifier::load(
        &config.artifacts.model_path,
        bundle.feature_count(),
        bundle.labels.num_classes(),
    )?;
    Ok(DetectionContext::new(bundle, Box::new(classifier)))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn run_batch(
    config: &ServiceConfig,
    user: &str,
    input: &Path,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ctx = load_context(config)?;
    let table = RecordTable::from_path(input)?;
    let scored = ctx.detect_batch(&table)?;

    let output = output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "records".to_string());
        input.with_file_name(format!("{stem}_detected.csv"))
    });
    scored.to_path(&output)?;

    let history = HistoryStore::open(&config.history_db_path())?;
    history.record_run(user, &file_label(input), "batch", scored.row_count() as u64)?;

    info!(output = %output.display(), records = scored.row_count(), "batch run complete");
    Ok(())
}

fn run_stream(
    config: &ServiceConfig,
    user: &str,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ctx = load_context(config)?;
    let table = RecordTable::from_path(input)?;

    let sessions = SessionStore::new(config.session_root());
    let session = sessions.start_session(user)?;

    install_stop_handler();
    let mut classified: u64 = 0;
    for result in ctx.detect_stream(&table, config.stream_delay())? {
        if stop_requested() {
            info!("stream stopped by operator");
            break;
        }
        let result = result?;
        sessions.append(&session, &result)?;
        info!(
            record = result.record_index,
            attack = %result.predicted_label,
            severity = %result.severity,
            confidence = result.confidence,
            "verdict"
        );
        classified += 1;
    }

    let history = HistoryStore::open(&config.history_db_path())?;
    history.record_run(user, &file_label(input), "stream", classified)?;

    info!(records = classified, session = %session.display(), "stream run complete");
    Ok(())
}

fn run_live(
    config: &ServiceConfig,
    user: &str,
    source: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ctx = load_context(config)?;

    let sessions = SessionStore::new(config.session_root());
    let session = sessions.start_session(user)?;

    let source = source.or_else(|| config.capture.source.clone());
    let reader: Box<dyn std::io::Read> = match &source {
        Some(path) => Box::new(std::fs::File::open(path)?),
        None => Box::new(std::io::stdin()),
    };
    let label = source
        .as_deref()
        .map(file_label)
        .unwrap_or_else(|| "stdin".to_string());

    install_stop_handler();
    let mut tracker = FlowTracker::new();
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    for packet in rdr.deserialize::<PacketMeta>() {
        if stop_requested() {
            info!("capture stopped by operator");
            break;
        }
        let packet = packet.map_err(flowsentry::Error::from)?;
        let vector = tracker.observe(&packet);
        let result = ctx.classify_record(&vector, tracker.packet_count() as usize)?;
        sessions.append(&session, &result)?;
        info!(
            packet = tracker.packet_count(),
            attack = %result.predicted_label,
            severity = %result.severity,
            confidence = result.confidence,
            "verdict"
        );
    }

    let history = HistoryStore::open(&config.history_db_path())?;
    history.record_run(user, &label, "live", tracker.packet_count())?;

    info!(packets = tracker.packet_count(), session = %session.display(), "capture complete");
    Ok(())
}

fn run_fit(
    config: &ServiceConfig,
    input: &Path,
    label_column: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let report = training::fit_artifacts(input, label_column, &config.artifacts.dir)?;
    info!(
        rows = report.rows,
        columns = report.columns,
        classes = ?report.classes,
        dir = %config.artifacts.dir.display(),
        "artifacts fitted"
    );
    Ok(())
}

fn run_status(config: &ServiceConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let status = training::TrainingStatus::load(&config.artifacts.dir.join(training::STATUS_FILE));
    let results =
        training::TrainingResults::load(&config.artifacts.dir.join(training::RESULTS_FILE));
    let history = HistoryStore::open(&config.history_db_path())?;
    let runs = history.recent_runs(10)?;

    let report = serde_json::json!({
        "training": status,
        "final_accuracy": results.as_ref().map(|r| r.final_accuracy),
        "recent_runs": runs,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("FLOWSENTRY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = ServiceConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    let user = std::env::var("FLOWSENTRY_USER").unwrap_or_else(|_| "local".to_string());

    std::fs::create_dir_all(&config.data_dir)?;

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("batch") => {
            let input = args.get(2).map(PathBuf::from).unwrap_or_else(|| usage());
            let output = args.get(3).map(PathBuf::from);
            run_batch(&config, &user, &input, output)
        }
        Some("stream") => {
            let input = args.get(2).map(PathBuf::from).unwrap_or_else(|| usage());
            run_stream(&config, &user, &input)
        }
        Some("live") => {
            let source = args.get(2).map(PathBuf::from);
            run_live(&config, &user, source)
        }
        Some("fit") => {
            let input = args.get(2).map(PathBuf::from).unwrap_or_else(|| usage());
            let label = args.get(3).map(String::as_str).unwrap_or("class");
            run_fit(&config, &input, label)
        }
        Some("status") => run_status(&config),
        _ => usage(),
    }
}
