//! Ferroscan - Main Entry Point
//!
//! Console front-end over the scanning engine, the realtime monitor, and
//! the quarantine manager.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ferroscan::engine::{Detection, ResultSink, ScanEngine};
use ferroscan::logging::init_logging;
use ferroscan::{Config, QuarantineManager, RealtimeMonitor, WatchBackend};

use tracing::{error, info};

fn main() {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("scan") => {
            let Some(target) = args.get(2) else {
                usage_and_exit();
            };
            let full = args.iter().any(|a| a == "--full");
            if let Err(e) = run_scan(Path::new(target), full) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        Some("watch") => {
            let Some(spec) = args.get(2) else {
                usage_and_exit();
            };
            if let Err(e) = run_watch(spec) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        Some("quarantine") | Some("restore") | Some("whitelist") => {
            let Some(target) = args.get(2) else {
                usage_and_exit();
            };
            run_quarantine_op(args[1].as_str(), target);
        }
        _ => usage_and_exit(),
    }
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: ferroscan <command>\n\
         \n\
         Commands:\n\
         \x20 scan <path> [--full]   scan a file or folder\n\
         \x20 watch <spec>           realtime-protect paths (';'/'|' separated)\n\
         \x20 quarantine <file>      move a file into quarantine\n\
         \x20 restore <stored>       restore a quarantined file\n\
         \x20 whitelist <file>       whitelist a file by SHA-256"
    );
    std::process::exit(2);
}

fn config_from_env() -> Config {
    let mut config = Config::default();
    if let Ok(path) = env::var("FERROSCAN_RULES") {
        config.rules_path = path;
    }
    if let Ok(path) = env::var("FERROSCAN_SIGNATURE_DB") {
        config.signature_db_path = path;
    }
    if let Ok(path) = env::var("FERROSCAN_QUARANTINE_DB") {
        config.quarantine_db_path = path;
    }
    if let Ok(path) = env::var("FERROSCAN_QUARANTINE_DIR") {
        config.quarantine_folder = path;
    }
    config
}

fn console_sink() -> ResultSink {
    Arc::new(|d: &Detection| {
        if d.filepath.is_empty() {
            println!("[{}] {}", d.severity, d.description);
            return;
        }
        let source = d
            .detection_source
            .map(|s| format!("{s:?}").to_uppercase())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "[{}] [{}] {} - {}",
            d.severity, source, d.filepath, d.description
        );
    })
}

fn init_engine(config: &Config) -> Result<Arc<ScanEngine>, Box<dyn std::error::Error>> {
    let sink = console_sink();
    let engine = ScanEngine::init(
        Path::new(&config.rules_path),
        Path::new(&config.signature_db_path),
        Some(&sink),
    )?;
    Ok(Arc::new(engine))
}

fn run_scan(target: &Path, full: bool) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = init_logging();
    let config = config_from_env();
    let engine = init_engine(&config)?;
    engine.set_full_scan(full);

    let sink = console_sink();
    if target.is_dir() {
        info!(folder = %target.display(), "scanning folder");
        engine.scan_folder(target, &sink);
        println!(
            "Done: {}/{} files",
            engine.get_completed_count(),
            engine.get_total_count()
        );
    } else {
        engine.scan_file(target, &sink);
    }
    Ok(())
}

fn run_watch(spec: &str) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = init_logging();
    let config = config_from_env();
    let engine = init_engine(&config)?;

    let monitor = RealtimeMonitor::new(engine, WatchBackend::Native);
    if !monitor.start_realtime(spec, console_sink()) {
        error!("realtime monitoring failed to start");
        return Err("failed to start realtime monitoring".into());
    }

    println!("Realtime protection active. Press Enter to stop.");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);

    monitor.stop_realtime();
    Ok(())
}

fn run_quarantine_op(op: &str, target: &str) {
    let _guard = init_logging();
    let config = config_from_env();
    let manager = QuarantineManager::new(
        PathBuf::from(&config.quarantine_db_path),
        PathBuf::from(&config.quarantine_folder),
    );

    let status = match op {
        "quarantine" => manager.quarantine(Path::new(target)),
        "restore" => manager.restore(target),
        _ => manager.whitelist(Path::new(target)),
    };
    println!("{status}");
    manager.shutdown();
}
