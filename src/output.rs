//! Text and CSV reports written after a run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::model::CategoryStats;
use crate::utils::{ensure_parent_dir, format_amount};

pub const PERFORMANCE_HEADER: &str = "mapThreads,reduceThreads,durationMillis";

/// Writes the ranked totals as fixed-width, left-justified columns
/// (15/12/10 wide) under a `Category Revenue Quantity` header.
pub fn write_results<W: Write>(mut out: W, ranked: &[(String, CategoryStats)]) -> Result<()> {
    writeln!(out, "{:<15} {:<12} {:<10}", "Category", "Revenue", "Quantity")?;
    for (category, stats) in ranked {
        writeln!(
            out,
            "{:<15} {:<12} {:<10}",
            category,
            format_amount(stats.total_revenue()),
            stats.total_quantity()
        )?;
    }
    out.flush()?;
    Ok(())
}

/// [`write_results`] into a file, creating parent directories as needed.
pub fn write_results_file(path: impl AsRef<Path>, ranked: &[(String, CategoryStats)]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    write_results(BufWriter::new(File::create(path)?), ranked)
}

/// One line of the performance report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProfileTiming {
    pub map_threads: usize,
    pub reduce_threads: usize,
    pub duration_millis: u128,
}

/// Streams the performance report row by row.
pub struct PerformanceReport<W: Write> {
    out: W,
}

impl<W: Write> PerformanceReport<W> {
    /// Starts the report by writing its header.
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "{PERFORMANCE_HEADER}")?;
        Ok(Self { out })
    }

    pub fn append(&mut self, timing: &ProfileTiming) -> Result<()> {
        writeln!(
            self.out,
            "{},{},{}",
            timing.map_threads, timing.reduce_threads, timing.duration_millis
        )?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
