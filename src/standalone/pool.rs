//! Fixed-size worker pool shared by the map and reduce phases.
//!
//! A phase hands the pool a slice of items. The pool cuts it into contiguous
//! chunks, one per worker at most, and runs them on scoped OS threads so the
//! items are borrowed rather than copied. The calling thread waits for every
//! chunk to report back, bounded by the phase timeout and by the caller's
//! [`CancellationFlag`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use tracing::{debug, error, warn};

use crate::error::{Error, Phase, Result};

/// Hard upper bound on how long a phase may take to quiesce.
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// How often the waiting thread re-checks the caller's cancellation flag.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A cloneable flag a caller raises to abort a running phase.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// `max(1, ceil(total / workers))`.
pub fn chunk_size(total: usize, workers: usize) -> usize {
    if total == 0 || workers == 0 {
        return 1;
    }
    total.div_ceil(workers).max(1)
}

pub(crate) struct PhasePool {
    phase: Phase,
    workers: usize,
    timeout: Duration,
}

impl PhasePool {
    pub(crate) fn new(phase: Phase, workers: usize, timeout: Duration) -> Self {
        Self {
            phase,
            workers,
            timeout,
        }
    }

    /// Runs `work` on every item, chunk by chunk.
    ///
    /// Items within a chunk are processed in order by a single worker. `work`
    /// returns an error only for failures that must abort the phase; the pool
    /// then stops handing out items and returns the first such error.
    pub(crate) fn run<T, F>(&self, items: &[T], cancel: &CancellationFlag, work: F) -> Result<()>
    where
        T: Sync,
        F: Fn(&T) -> Result<()> + Sync,
    {
        if items.is_empty() {
            return Ok(());
        }
        let chunk_size = chunk_size(items.len(), self.workers);

        let (task_tx, task_rx) = unbounded::<(usize, &[T])>();
        let mut chunk_count = 0;
        for (chunk_id, chunk) in items.chunks(chunk_size).enumerate() {
            // the receiver is alive until the end of this function
            let _ = task_tx.send((chunk_id, chunk));
            chunk_count += 1;
        }
        drop(task_tx);

        let (done_tx, done_rx) = unbounded::<Result<()>>();
        let stop = AtomicBool::new(false);
        let phase = self.phase;

        thread::scope(|scope| {
            for worker_id in 0..self.workers.min(chunk_count) {
                let task_rx = task_rx.clone();
                let done_tx = done_tx.clone();
                let stop = &stop;
                let work = &work;
                let spawned = thread::Builder::new()
                    .name(format!("{phase}-worker-{worker_id}"))
                    .spawn_scoped(scope, move || {
                        while let Ok((chunk_id, chunk)) = task_rx.recv() {
                            if stop.load(Ordering::Relaxed) {
                                break;
                            }
                            debug!(%phase, worker_id, chunk_id, len = chunk.len(), "chunk started");
                            let outcome = run_chunk(phase, chunk, stop, work);
                            if done_tx.send(outcome).is_err() {
                                break;
                            }
                        }
                    });
                if let Err(source) = spawned {
                    stop.store(true, Ordering::SeqCst);
                    return Err(Error::Spawn { phase, source });
                }
            }
            drop(done_tx);

            let outcome = self.await_chunks(chunk_count, &done_rx, cancel);
            if outcome.is_err() {
                stop.store(true, Ordering::SeqCst);
            }
            outcome
        })
    }

    fn await_chunks(
        &self,
        chunk_count: usize,
        done_rx: &Receiver<Result<()>>,
        cancel: &CancellationFlag,
    ) -> Result<()> {
        let phase = self.phase;
        let deadline = Instant::now() + self.timeout;
        let mut remaining = chunk_count;

        while remaining > 0 {
            if cancel.is_cancelled() {
                warn!(%phase, remaining, "phase cancelled, stopping outstanding chunks");
                return Err(Error::Cancelled { phase });
            }
            let now = Instant::now();
            if now >= deadline {
                error!(%phase, remaining, timeout = ?self.timeout, "phase timed out, stopping outstanding chunks");
                return Err(Error::Timeout {
                    phase,
                    timeout: self.timeout,
                });
            }

            match done_rx.recv_timeout((deadline - now).min(CANCEL_POLL_INTERVAL)) {
                Ok(Ok(())) => remaining -= 1,
                Ok(Err(err)) => {
                    error!(%phase, error = %err, "chunk failed, aborting phase");
                    return Err(err);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::WorkerPanicked {
                        phase,
                        message: format!("workers exited with {remaining} chunk(s) unreported"),
                    });
                }
            }
        }
        Ok(())
    }
}

fn run_chunk<T, F>(phase: Phase, chunk: &[T], stop: &AtomicBool, work: &F) -> Result<()>
where
    F: Fn(&T) -> Result<()>,
{
    catch_panic(phase, || {
        for item in chunk {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            work(item)?;
        }
        Ok(())
    })
}

/// Runs `call`, turning a panic into [`Error::WorkerPanicked`].
pub(crate) fn catch_panic<R>(phase: Phase, call: impl FnOnce() -> Result<R>) -> Result<R> {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        Err(Error::WorkerPanicked {
            phase,
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
