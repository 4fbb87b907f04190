//! Timing sweep over (map workers, reduce workers) profiles.

use std::io::Write;
use std::time::Instant;

use itertools::iproduct;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::SalesRecord;
use crate::output::{PerformanceReport, ProfileTiming};
use crate::standalone::engine::{analyze_with, MapPhaseRunner, ReducePhaseRunner};
use crate::standalone::pool::CancellationFlag;

/// Which worker counts to try, and how long each phase may take.
#[derive(Clone, Debug)]
pub struct Sweep {
    pub map_profiles: Vec<usize>,
    pub reduce_profiles: Vec<usize>,
    pub phase_timeout: std::time::Duration,
}

impl Sweep {
    fn validate(&self) -> Result<()> {
        if self.map_profiles.is_empty() || self.reduce_profiles.is_empty() {
            return Err(Error::config("performance sweep needs at least one map and one reduce profile"));
        }
        Ok(())
    }
}

/// Runs the full sales job once per profile, outer loop over map profiles
/// and inner loop over reduce profiles, and appends one row per run to
/// `report`.
///
/// Each run gets fresh runners and a fresh context. The measured time covers
/// map, reduce and ranking.
pub fn run_sweep<W: Write>(
    records: &[SalesRecord],
    sweep: &Sweep,
    report: &mut PerformanceReport<W>,
    cancel: &CancellationFlag,
) -> Result<Vec<ProfileTiming>> {
    sweep.validate()?;
    info!(
        map_profiles = ?sweep.map_profiles,
        reduce_profiles = ?sweep.reduce_profiles,
        "running performance experiments"
    );

    let mut timings = Vec::with_capacity(sweep.map_profiles.len() * sweep.reduce_profiles.len());
    for (&map_threads, &reduce_threads) in iproduct!(&sweep.map_profiles, &sweep.reduce_profiles) {
        let map_runner = MapPhaseRunner::new(map_threads)?.with_timeout(sweep.phase_timeout)?;
        let reduce_runner = ReducePhaseRunner::new(reduce_threads)?.with_timeout(sweep.phase_timeout)?;

        let start = Instant::now();
        let ranked = analyze_with(records, &map_runner, &reduce_runner, cancel)?;
        let timing = ProfileTiming {
            map_threads,
            reduce_threads,
            duration_millis: start.elapsed().as_millis(),
        };

        debug!(
            map_threads,
            reduce_threads,
            categories = ranked.len(),
            duration_ms = %timing.duration_millis,
            "profile finished"
        );
        report.append(&timing)?;
        timings.push(timing);
    }
    Ok(timings)
}
