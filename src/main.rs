//! afconverge - Trace replay entry point

use afconverge::{
    cli::{Args, Commands},
    config::Config,
    logging,
    session::{AutoFocusDriver, SessionReport, TraceSource},
    telemetry::TelemetryCollector,
    trace,
};
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = args.verbosity().log_level() {
        config.logging.level = level.to_string();
    }
    logging::init(&config.logging);

    match &args.command {
        Commands::Replay {
            trace,
            precapture,
            regions,
            cancel_after,
            json,
        } => replay(&config, trace, *precapture, *regions, *cancel_after, *json).await,
        Commands::Config => show_config(&config),
    }
}

/// Replay a trace file through one session
async fn replay(
    config: &Config,
    trace_path: &Path,
    precapture: bool,
    regions: usize,
    cancel_after: Option<usize>,
    json: bool,
) -> Result<()> {
    let observations = trace::load_trace(trace_path)
        .with_context(|| format!("Failed to load trace {}", trace_path.display()))?;

    let driver = AutoFocusDriver::new(config.machine.clone(), config.session.clone());
    let mut source = TraceSource::new(observations);
    if let Some(count) = cancel_after {
        source = source.cancel_after(count, driver.cancel_flag());
    }

    let session = if precapture {
        driver.run_precapture(source).await
    } else {
        driver.run_lock(regions, source).await
    }
    .context("Replay session failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        display_session(&session, driver.telemetry());
    }

    Ok(())
}

fn display_session(session: &SessionReport, telemetry: &TelemetryCollector) {
    let report = &session.report;
    let headline = if report.outcome.is_success() {
        "✓ Success".green().bold()
    } else {
        "✗ Failure".red().bold()
    };

    println!("\n{} ({})", headline, report.reason);
    println!("─────────────────────────────────────");
    println!("Session:           {}", session.session_id);
    println!("Phase:             {}", session.phase.display_name());
    println!(
        "Last AF state:     {}",
        report
            .af_state
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Focus locked:      {}", report.focus_locked());
    println!("Observations:      {}", report.observations);
    println!("Transitions:       {}", telemetry.get_stats().state_transitions);
    println!("Elapsed:           {}ms", session.elapsed_ms);
    println!();
}

fn show_config(config: &Config) -> Result<()> {
    if let Some(path) = Config::default_path() {
        println!("{} {}", "Default location:".dimmed(), path.display());
    }
    println!("{}", toml::to_string_pretty(config).context("Failed to render configuration")?);
    Ok(())
}
