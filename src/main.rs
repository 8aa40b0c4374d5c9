//! aqscreen: AQ-10 screening questionnaire
//!
//! Main entry point. Runs the terminal UI, or with `--json <file>` screens a
//! single JSON-encoded response and prints the result as JSON.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aqscreen::adapters::sanitize::SanitizingMakeWriter;
use aqscreen::application::{init_global, SessionState};
use aqscreen::domain::Outcome;
use aqscreen::tui::App;
use aqscreen::{AppConfig, RawResponse};

const USAGE: &str = "Usage: aqscreen [--json <response.json | ->]";

/// Headless output.
#[derive(Debug, Serialize)]
struct HeadlessOutput {
    predicted_label: u8,
    positive_probability: f64,
    outcome: Outcome,
    confidence: f64,
}

fn parse_args() -> Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    let mut json_input = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => {
                let path = args.next().context(USAGE)?;
                json_input = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ => bail!("Unknown argument {arg:?}\n{USAGE}"),
        }
    }
    Ok(json_input)
}

fn init_logging(config: &AppConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // Writing logs to the terminal would corrupt the TUI (alternate screen).
    let interactive = std::io::stdout().is_terminal();
    let use_file = config.log_mode.use_file(interactive);

    let (writer, guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("Failed to open log file {:?}", config.log_file))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}

fn run_headless(path: &Path, config: &AppConfig) -> Result<()> {
    let service = init_global(config);
    if let SessionState::LoadFailed(reason) = service.state() {
        bail!("Screening unavailable: {reason}");
    }

    let input = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {path:?}"))?
    };
    let response: RawResponse =
        serde_json::from_str(&input).context("Input is not a valid response")?;

    let result = service.submit(&response)?;
    let output = HeadlessOutput {
        predicted_label: result.predicted_label,
        positive_probability: result.positive_probability,
        outcome: result.outcome(),
        confidence: result.confidence(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<()> {
    let json_input = parse_args()?;
    let config = AppConfig::from_env();
    let _guard = init_logging(&config)?;

    tracing::info!("Starting aqscreen...");

    match json_input {
        Some(path) => run_headless(&path, &config)?,
        None => {
            let service = init_global(&config);
            let mut app = App::new(service);
            app.run()?;
        }
    }

    tracing::info!("aqscreen shutdown complete.");
    Ok(())
}
