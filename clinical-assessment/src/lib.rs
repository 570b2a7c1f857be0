// Clinical Assessment Wizard
// Main library entry point

pub mod models;
pub mod settings;
pub mod submission;
pub mod tui;
pub mod utils;
pub mod wizard;

use log::{error, info};
use std::path::{Path, PathBuf};

use settings::{AppConfig, LoggingConfig};

/// Initialize logging with dual format (JSON + human-readable). Returns the log directory.
pub fn init_logging(cfg: &LoggingConfig, with_stdout: bool) -> anyhow::Result<PathBuf> {
    let log_dir = utils::path_resolver::resolve_log_folder(cfg.dir.as_deref())?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");
    let json_log_file = log_dir.join(format!("assessment-{}.log", timestamp));
    let txt_log_file = log_dir.join(format!("assessment-{}.txt", timestamp));

    // stdout stays off for the TUI so the terminal is not corrupted
    let mut dispatch = fern::Dispatch::new().level(cfg.level_filter());

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", json_line));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", txt_line));
                })
                .chain(fern::log_file(txt_log_file)?),
        );

    dispatch.apply()?;

    info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(log_dir)
}

fn load_config_or_exit(config_path: Option<&Path>) -> AppConfig {
    match AppConfig::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    }
}

pub fn run_tui(config_path: Option<&Path>) {
    let config = load_config_or_exit(config_path);

    // No stdout: it would corrupt the TUI
    if let Err(e) = init_logging(&config.logging, false) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] Assessment TUI starting at {}",
        chrono::Utc::now()
    );

    let backend = match submission::build_backend(&config.submission) {
        Ok(b) => b,
        Err(e) => {
            error!(
                "[PHASE: initialization] [STEP: backend] Submission backend unavailable: {:?}",
                e
            );
            eprintln!("Assessment error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "[PHASE: initialization] [STEP: backend] Submission backend: {}",
        backend.name()
    );

    if let Err(e) = tui::run(backend) {
        error!("[PHASE: tui] [STEP: fatal] TUI exited with error: {:?}", e);
        eprintln!("Assessment error: {}", e);
        std::process::exit(1);
    }
}

/// Non-interactive TUI smoke mode (for automated checks).
/// Renders a single frame in memory and exits 0/1.
pub fn run_tui_smoke(target: Option<String>, config_path: Option<&Path>) {
    let config = load_config_or_exit(config_path);
    if let Err(e) = init_logging(&config.logging, false) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let target = target.as_deref().unwrap_or("home");
    info!(
        "[PHASE: initialization] [STEP: smoke] TUI smoke starting for page '{}'",
        target
    );

    if let Err(e) = tui::smoke(target) {
        error!(
            "[PHASE: tui] [STEP: smoke] TUI smoke exited with error: {:?}",
            e
        );
        eprintln!("Assessment error: {}", e);
        std::process::exit(1);
    }
    println!("TUI smoke OK: {}", target);
}

/// Print the effective configuration (defaults + file + environment) as TOML.
pub fn print_config(config_path: Option<&Path>) {
    let config = load_config_or_exit(config_path);
    match config.to_toml() {
        Ok(s) => print!("{}", s),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    }
}
