use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;
use fnv::FnvBuildHasher;
use itertools::Itertools;
use tracing::{error, info, warn};

use crate::context::{GroupedView, InMemoryMapContext, MapContext};
use crate::error::{Error, Phase, Result};
use crate::model::{CategoryStats, SalesRecord};
use crate::standalone::pool::{
    catch_panic, chunk_size, CancellationFlag, PhasePool, DEFAULT_PHASE_TIMEOUT,
};
use crate::workload::sales::{SalesMapper, SalesReducer};
use crate::{Mapper, Reducer};

/// One reduced output per key that had at least one value.
pub type ResultMap<K, Out> = BTreeMap<K, Out>;

fn check_workers(phase: Phase, workers: usize) -> Result<()> {
    if workers == 0 {
        return Err(Error::config(format!(
            "{phase} worker count must be at least 1"
        )));
    }
    Ok(())
}

fn check_timeout(timeout: Duration) -> Result<()> {
    if timeout.is_zero() {
        return Err(Error::config("phase timeout must be positive"));
    }
    Ok(())
}

/// Runs a [`Mapper`] over a slice of inputs with a fixed number of workers.
///
/// The input is split into contiguous blocks of `ceil(len / workers)` records;
/// each block is mapped in order by a single worker. A record whose mapper
/// returns a value error or panics is logged and skipped.
#[derive(Clone, Debug)]
pub struct MapPhaseRunner {
    workers: usize,
    timeout: Duration,
}

impl MapPhaseRunner {
    pub fn new(workers: usize) -> Result<Self> {
        check_workers(Phase::Map, workers)?;
        Ok(Self {
            workers,
            timeout: DEFAULT_PHASE_TIMEOUT,
        })
    }

    /// Replaces the default 5 minute bound on the phase.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        check_timeout(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run<In, K, V, M, C>(&self, records: &[In], mapper: &M, context: &C) -> Result<()>
    where
        In: Sync + Debug,
        M: Mapper<In, K, V>,
        C: MapContext<K, V>,
    {
        self.run_with_cancel(records, mapper, context, &CancellationFlag::new())
    }

    /// Like [`MapPhaseRunner::run`], but gives up as soon as `cancel` is raised.
    pub fn run_with_cancel<In, K, V, M, C>(
        &self,
        records: &[In],
        mapper: &M,
        context: &C,
        cancel: &CancellationFlag,
    ) -> Result<()>
    where
        In: Sync + Debug,
        M: Mapper<In, K, V>,
        C: MapContext<K, V>,
    {
        if records.is_empty() {
            info!("no records to process, skipping map phase");
            return Ok(());
        }
        info!(
            records = records.len(),
            workers = self.workers,
            chunk_size = chunk_size(records.len(), self.workers),
            "starting map phase"
        );

        PhasePool::new(Phase::Map, self.workers, self.timeout).run(records, cancel, |record| {
            match catch_panic(Phase::Map, || mapper.map(record, context)) {
                Err(err @ Error::WorkerPanicked { .. }) => {
                    error!(?record, error = %err, "mapper panicked, dropping record");
                    Ok(())
                }
                Err(err) if err.is_recoverable() => {
                    warn!(?record, error = %err, "dropping record that failed to map");
                    Ok(())
                }
                outcome => outcome,
            }
        })?;

        info!("map phase completed");
        Ok(())
    }
}

/// Runs a [`Reducer`] over grouped map output with a fixed number of workers.
///
/// Keys are taken in the view's order and split into contiguous blocks, so
/// every key is reduced by exactly one worker. A key whose reducer returns a
/// value error or panics is left out of the result.
#[derive(Clone, Debug)]
pub struct ReducePhaseRunner {
    workers: usize,
    timeout: Duration,
}

impl ReducePhaseRunner {
    pub fn new(workers: usize) -> Result<Self> {
        check_workers(Phase::Reduce, workers)?;
        Ok(Self {
            workers,
            timeout: DEFAULT_PHASE_TIMEOUT,
        })
    }

    /// Replaces the default 5 minute bound on the phase.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        check_timeout(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run_reduce<K, V, Out, R>(
        &self,
        grouped: &GroupedView<K, V>,
        reducer: &R,
    ) -> Result<ResultMap<K, Out>>
    where
        K: Ord + Hash + Clone + Send + Sync + Debug,
        V: Sync,
        Out: Send + Sync,
        R: Reducer<K, V, Out>,
    {
        self.run_reduce_with_cancel(grouped, reducer, &CancellationFlag::new())
    }

    /// Like [`ReducePhaseRunner::run_reduce`], but gives up as soon as
    /// `cancel` is raised.
    pub fn run_reduce_with_cancel<K, V, Out, R>(
        &self,
        grouped: &GroupedView<K, V>,
        reducer: &R,
        cancel: &CancellationFlag,
    ) -> Result<ResultMap<K, Out>>
    where
        K: Ord + Hash + Clone + Send + Sync + Debug,
        V: Sync,
        Out: Send + Sync,
        R: Reducer<K, V, Out>,
    {
        if grouped.is_empty() {
            info!("no keys to reduce, returning empty result");
            return Ok(ResultMap::new());
        }

        let keys = grouped.keys().collect_vec();
        info!(
            keys = keys.len(),
            workers = self.workers,
            chunk_size = chunk_size(keys.len(), self.workers),
            "starting reduce phase"
        );

        // every key belongs to exactly one chunk, so writers never share a key
        let reduced: DashMap<K, Out, FnvBuildHasher> = DashMap::with_hasher(FnvBuildHasher::default());
        PhasePool::new(Phase::Reduce, self.workers, self.timeout).run(&keys, cancel, |key| {
            let values = match grouped.get(*key) {
                Some(values) if !values.is_empty() => values,
                _ => return Ok(()),
            };
            match catch_panic(Phase::Reduce, || reducer.reduce(*key, values)) {
                Ok(out) => {
                    reduced.insert((*key).clone(), out);
                    Ok(())
                }
                Err(err @ Error::WorkerPanicked { .. }) => {
                    error!(?key, error = %err, "reducer panicked, omitting key");
                    Ok(())
                }
                Err(err) if err.is_recoverable() => {
                    warn!(?key, error = %err, "omitting key that failed to reduce");
                    Ok(())
                }
                Err(err) => Err(err),
            }
        })?;

        let result: ResultMap<K, Out> = reduced.into_iter().collect();
        info!(result_size = result.len(), "reduce phase completed");
        Ok(result)
    }
}

/// Orders reduced categories by revenue, highest first.
///
/// The sort is stable, so categories with equal revenue keep the map's
/// (ascending key) order.
pub fn rank_by_revenue<K>(reduced: ResultMap<K, CategoryStats>) -> Vec<(K, CategoryStats)> {
    reduced
        .into_iter()
        .sorted_by(|(_, a), (_, b)| b.total_revenue().cmp(&a.total_revenue()))
        .collect()
}

/// Runs the sales job end to end: map, reduce, rank.
pub fn analyze(
    records: &[SalesRecord],
    map_threads: usize,
    reduce_threads: usize,
) -> Result<Vec<(String, CategoryStats)>> {
    analyze_with(
        records,
        &MapPhaseRunner::new(map_threads)?,
        &ReducePhaseRunner::new(reduce_threads)?,
        &CancellationFlag::new(),
    )
}

/// [`analyze`] with caller-supplied runners and cancellation.
pub fn analyze_with(
    records: &[SalesRecord],
    map_runner: &MapPhaseRunner,
    reduce_runner: &ReducePhaseRunner,
    cancel: &CancellationFlag,
) -> Result<Vec<(String, CategoryStats)>> {
    let context: InMemoryMapContext<String, CategoryStats> = InMemoryMapContext::new();
    map_runner.run_with_cancel(records, &SalesMapper, &context, cancel)?;

    let grouped = context.into_grouped_view();
    let reduced = reduce_runner.run_reduce_with_cancel(&grouped, &SalesReducer, cancel)?;
    Ok(rank_by_revenue(reduced))
}
