//! `kinesis-cli` – command line front end for the kinesis motion engine.
//!
//! ```text
//! kinesis init                      write a default ~/.kinesis/config.toml
//! kinesis templates                 list the configured template store
//! kinesis replay <recording.jsonl>  feed a recorded session through the engine
//! kinesis help
//! ```
//!
//! Settings come from `~/.kinesis/config.toml` (see [`config`]).  Ctrl-C
//! stops a replay after the current line.

mod config;
mod recording;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use kinesis_memory::{DirectoryStore, TemplateDatabase};
use kinesis_middleware::{Topic, TopicReceiver};
use kinesis_runtime::MotionEngine;
use kinesis_types::{EventPayload, KinesisError, MatchResult};
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tracing::warn;

use crate::recording::RecordedLine;

/// What waiting on a scheduled match can produce.
type MatchWait = Result<Result<Result<MatchResult, KinesisError>, JoinError>, Elapsed>;

/// Longest wait for a scheduled match to report back.
const MATCH_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> ExitCode {
    let _telemetry = kinesis_runtime::init_tracing("kinesis");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = match args.first().map(String::as_str) {
        Some("init") => cmd_init(),
        Some("templates") => cmd_templates(),
        Some("replay") => match args.get(1) {
            Some(path) => cmd_replay(Path::new(path)),
            None => Err("usage: kinesis replay <recording.jsonl>".to_string()),
        },
        None | Some("help") | Some("--help") | Some("-h") => {
            print_help();
            Ok(())
        }
        Some(other) => Err(format!("unknown command `{other}`; try `kinesis help`")),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("{} {}", "kinesis".bold(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("  Skeletal gesture recognition and motion assessment");
    println!();
    println!("  {}                      write a default config file", "init".cyan());
    println!("  {}                 list stored gesture templates", "templates".cyan());
    println!("  {}  replay a recorded session", "replay <file.jsonl>".cyan());
    println!("  {}                      show this message", "help".cyan());
}

// ─────────────────────────────────────────────────────────────────────────────
// init
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_init() -> Result<(), String> {
    let path = config::config_path();
    if !config::init()? {
        println!("  Config already present at {}", path.display().to_string().bold());
        return Ok(());
    }
    println!(
        "  {} Config saved to {}",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    println!(
        "  Templates directory: {}",
        config::Config::default().templates_dir.display()
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// templates
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_templates() -> Result<(), String> {
    let cfg = config::load_or_default()?;
    let store = DirectoryStore::new(&cfg.templates_dir);
    let mut db = TemplateDatabase::new();
    let report = db.load_from(&store).map_err(|e| e.to_string())?;

    println!("  Templates in {}", cfg.templates_dir.display().to_string().bold());
    for template in &db {
        println!(
            "    {} {:<16} {:>4} frames  {}",
            "•".cyan(),
            template.label().to_string().bold(),
            template.sequence().len(),
            template.id().to_string().dimmed()
        );
    }
    println!("  {} loaded, {} skipped", report.loaded.to_string().green(), report.skipped);
    for failure in &report.failures {
        println!("    {} {}: {}", "✗".red(), failure.origin, failure.reason);
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// replay
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_replay(path: &Path) -> Result<(), String> {
    let cfg = config::load_or_default()?;
    let lines = recording::read_recording(path)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping replay …".yellow().bold());
        shutdown_flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler");
    }

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;
    let mut engine = MotionEngine::with_handle(cfg.engine_config(), runtime.handle().clone());
    let mut alerts = engine.subscribe(Topic::SystemAlerts);

    match engine.load_templates(&DirectoryStore::new(&cfg.templates_dir)) {
        Ok(report) => println!(
            "  {} template(s) loaded, {} skipped",
            report.loaded.to_string().green(),
            report.skipped
        ),
        Err(e) => println!("  {}: {}", "Templates unavailable".yellow(), e),
    }

    let mut frames = 0usize;
    for line in lines {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match line {
            RecordedLine::Frame { timestamp, pose } => {
                engine.submit_frame(&pose, timestamp);
                frames += 1;
            }
            RecordedLine::Begin => {
                if let Err(e) = engine.begin_capture() {
                    println!("  {}: {}", "begin ignored".yellow(), e);
                }
            }
            RecordedLine::End => match engine.complete_capture() {
                Ok((sequence, handle)) => {
                    println!("  captured {} frame(s), matching …", sequence.len());
                    match handle {
                        Some(handle) => print_match(
                            runtime.block_on(async { tokio::time::timeout(MATCH_TIMEOUT, handle).await }),
                        ),
                        None => println!("  {} previous match still running", "busy:".yellow()),
                    }
                }
                Err(e) => println!("  {}: {}", "end ignored".yellow(), e),
            },
            RecordedLine::Disconnect => engine.sensor_disconnected(),
        }
        drain_alerts(&mut alerts);
    }

    println!("  {} frame(s) replayed", frames);
    Ok(())
}

fn print_match(outcome: MatchWait) {
    match outcome {
        Ok(Ok(Ok(result))) => println!(
            "  {} {} (distance {:.4}, {} template(s) compared)",
            "✓".green().bold(),
            result.label.to_string().bold(),
            result.distance,
            result.templates_compared
        ),
        Ok(Ok(Err(err))) => println!("  {} {}", "✗".red().bold(), err),
        Ok(Err(join_err)) => println!("  {} match task failed: {}", "✗".red().bold(), join_err),
        Err(_) => println!("  {}", "match timed out".red()),
    }
}

fn drain_alerts(alerts: &mut TopicReceiver) {
    while let Ok(event) = alerts.try_recv() {
        if let EventPayload::CaptureAborted { frames_discarded, reason } = event.payload {
            println!(
                "  {} capture aborted ({reason}), {frames_discarded} frame(s) discarded",
                "⚠".yellow()
            );
        }
    }
}
