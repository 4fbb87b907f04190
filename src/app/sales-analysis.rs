use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use salesmr::input::{self, Ingested};
use salesmr::output::{self, PerformanceReport};
use salesmr::standalone::engine::analyze_with;
use salesmr::standalone::perf::run_sweep;
use salesmr::standalone::{Args, Job};
use salesmr::utils::ensure_parent_dir;
use salesmr::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn load_records(job: &Job) -> Result<Ingested> {
    let ingested = match job.files_count {
        Some(count) => input::read_numbered_files(&job.input, count),
        None => input::read_all_from_directory(&job.input),
    }
    .with_context(|| format!("failed to read sales records from {}", job.input.display()))?;

    info!(
        records = ingested.records.len(),
        rejected = ingested.rejected,
        input = %job.input.display(),
        "loaded sales records"
    );
    Ok(ingested)
}

fn run_single_analysis(job: &Job, records: &[SalesRecord]) -> Result<()> {
    info!(
        map_threads = job.map_threads,
        reduce_threads = job.reduce_threads,
        "running single analysis"
    );
    let map_runner = MapPhaseRunner::new(job.map_threads)?.with_timeout(job.phase_timeout)?;
    let reduce_runner = ReducePhaseRunner::new(job.reduce_threads)?.with_timeout(job.phase_timeout)?;

    let start = Instant::now();
    let ranked = analyze_with(records, &map_runner, &reduce_runner, &CancellationFlag::new())?;
    info!(
        duration_ms = %start.elapsed().as_millis(),
        categories = ranked.len(),
        "single analysis finished"
    );

    output::write_results_file(&job.output, &ranked)
        .with_context(|| format!("failed to write {}", job.output.display()))?;
    info!(path = %job.output.display(), "results written");
    Ok(())
}

fn run_performance_experiments(job: &Job, records: &[SalesRecord]) -> Result<()> {
    let Some(sweep) = &job.sweep else {
        return Ok(());
    };
    ensure_parent_dir(&job.perf_output)?;
    let file = File::create(&job.perf_output)
        .with_context(|| format!("failed to create {}", job.perf_output.display()))?;

    let mut report = PerformanceReport::new(BufWriter::new(file))?;
    run_sweep(records, sweep, &mut report, &CancellationFlag::new())?;
    report.finish()?;

    let path = std::fs::canonicalize(&job.perf_output).unwrap_or_else(|_| job.perf_output.clone());
    info!(path = %path.display(), "performance results written");
    Ok(())
}

fn run(job: Job) -> Result<()> {
    let ingested = load_records(&job)?;
    run_single_analysis(&job, &ingested.records)?;
    run_performance_experiments(&job, &ingested.records)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let job = Job::from(Args::parse());
    match run(job) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
