use anyhow::{Context, Result};
use clap::Parser;
use optrace::cli::{Cli, Command};
use optrace::clock::ClockSample;
use optrace::config::ReconstructConfig;
use optrace::event;
use optrace::session::ProfilingSession;
use optrace::timeline::{PublishedSpan, Timeline, TracingSink};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; warnings always reach stderr, everything
/// else only with `--debug`
fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::TRACE
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ReconstructConfig> {
    match path {
        Some(path) => ReconstructConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ReconstructConfig::default()),
    }
}

fn run_reconstruct(
    config: ReconstructConfig,
    events_path: &Path,
    output: Option<PathBuf>,
    clock_sample: Option<ClockSample>,
    origin_file: Option<PathBuf>,
) -> Result<()> {
    let events = event::load_events(events_path)
        .with_context(|| format!("Failed to load events from {}", events_path.display()))?;

    let sample = clock_sample.unwrap_or_else(|| {
        tracing::warn!(
            "No --clock-sample given; origin_us stays on the instrumentation clock"
        );
        ClockSample::default()
    });
    let report = ProfilingSession::new(config).reconstruct(&events, sample)?;

    match output {
        Some(path) => std::fs::write(&path, &report.trace_json)
            .with_context(|| format!("Failed to write trace to {}", path.display()))?,
        None => print!("{}", report.trace_json),
    }

    match origin_file {
        Some(path) => std::fs::write(&path, format!("{}\n", report.origin_us))
            .with_context(|| format!("Failed to write origin to {}", path.display()))?,
        None => eprintln!("origin_us: {}", report.origin_us),
    }

    Ok(())
}

fn run_timeline(config: ReconstructConfig, trace_path: &Path, origin_us: i64) -> Result<()> {
    let json = std::fs::read_to_string(trace_path)
        .with_context(|| format!("Failed to read trace {}", trace_path.display()))?;
    let mut timeline = Timeline::parse(&json, origin_us)?;

    let mut sinks = (TracingSink, Vec::<PublishedSpan>::new());
    timeline.publish(&mut sinks, &config.wrapper_name)?;

    for span in &sinks.1 {
        println!(
            "{:>4} {:<40} tid={:<6} start_ns={} dur_ns={}",
            span.layer_sequence_index,
            span.name,
            span.thread_id,
            span.start_ns,
            span.duration_ns()
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Warnings only, unless --debug is set
    init_tracing(args.debug);

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Reconstruct {
            events,
            output,
            clock_sample,
            origin_file,
        } => run_reconstruct(config, &events, output, clock_sample, origin_file),
        Command::Timeline { trace, origin_us } => run_timeline(config, &trace, origin_us),
    }
}
