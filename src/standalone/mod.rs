use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::standalone::perf::Sweep;

pub mod engine;
pub mod perf;
pub mod pool;

#[derive(Parser, Debug)]
#[command(version, about = "Per-category sales totals on an in-process MapReduce engine", long_about = None)]
pub struct Args {
    /// Directory holding the input `.csv` files
    #[arg(short, long, default_value = "data")]
    pub input: PathBuf,

    /// Read exactly `0.csv` .. `<N-1>.csv` instead of every `.csv` file
    #[arg(long)]
    pub files_count: Option<usize>,

    /// Ranked result report
    #[arg(short, long, default_value = "output/result.txt")]
    pub output: PathBuf,

    /// Performance sweep report (CSV)
    #[arg(long, default_value = "output/performance.csv")]
    pub perf_output: PathBuf,

    /// Map workers for the single analysis
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u64).range(1..))]
    pub map_threads: u64,

    /// Reduce workers for the single analysis
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u64).range(1..))]
    pub reduce_threads: u64,

    /// Map worker counts tried by the sweep, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [1u64, 2, 4, 8], value_parser = clap::value_parser!(u64).range(1..))]
    pub map_profiles: Vec<u64>,

    /// Reduce worker counts tried by the sweep, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [1u64, 2, 4, 8], value_parser = clap::value_parser!(u64).range(1..))]
    pub reduce_profiles: Vec<u64>,

    /// Upper bound on each phase, in seconds
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    pub phase_timeout_secs: u64,

    /// Only run the single analysis
    #[arg(long)]
    pub skip_sweep: bool,
}

/// A fully resolved analysis run.
#[derive(Debug, Clone)]
pub struct Job {
    pub input: PathBuf,
    pub files_count: Option<usize>,
    pub output: PathBuf,
    pub perf_output: PathBuf,
    pub map_threads: usize,
    pub reduce_threads: usize,
    pub sweep: Option<Sweep>,
    pub phase_timeout: Duration,
}

impl From<Args> for Job {
    fn from(args: Args) -> Self {
        let phase_timeout = Duration::from_secs(args.phase_timeout_secs);
        let sweep = (!args.skip_sweep).then(|| Sweep {
            map_profiles: args.map_profiles.iter().map(|&n| n as usize).collect(),
            reduce_profiles: args.reduce_profiles.iter().map(|&n| n as usize).collect(),
            phase_timeout,
        });
        Job {
            input: args.input,
            files_count: args.files_count,
            output: args.output,
            perf_output: args.perf_output,
            map_threads: args.map_threads as usize,
            reduce_threads: args.reduce_threads as usize,
            sweep,
            phase_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_run() {
        let job = Job::from(Args::parse_from(["sales-analysis"]));
        assert_eq!(job.input, PathBuf::from("data"));
        assert_eq!(job.output, PathBuf::from("output/result.txt"));
        assert_eq!(job.perf_output, PathBuf::from("output/performance.csv"));
        assert_eq!((job.map_threads, job.reduce_threads), (4, 4));
        assert_eq!(job.phase_timeout, Duration::from_secs(300));
        let sweep = job.sweep.unwrap();
        assert_eq!(sweep.map_profiles, vec![1, 2, 4, 8]);
        assert_eq!(sweep.reduce_profiles, vec![1, 2, 4, 8]);
    }

    #[test]
    fn overrides_are_applied() {
        let job = Job::from(Args::parse_from([
            "sales-analysis",
            "-i",
            "in",
            "-m",
            "2",
            "-r",
            "3",
            "--map-profiles",
            "1,2",
            "--skip-sweep",
        ]));
        assert_eq!(job.input, PathBuf::from("in"));
        assert_eq!((job.map_threads, job.reduce_threads), (2, 3));
        assert!(job.sweep.is_none());
    }

    #[test]
    fn zero_threads_are_rejected() {
        assert!(Args::try_parse_from(["sales-analysis", "-m", "0"]).is_err());
        assert!(Args::try_parse_from(["sales-analysis", "--reduce-profiles", "1,0"]).is_err());
    }
}
