//! An embeddable, in-process MapReduce (lite) runtime and the sales workload
//! built on top of it.
//!
//! Users supply a [`Mapper`] and a [`Reducer`]; the standalone engine splits
//! the input into contiguous chunks, maps them on a fixed-size pool of worker
//! threads into a shared, grouped [`MapContext`], and then reduces the grouped
//! keys on a second pool. The sales workload turns CSV transaction rows into
//! per-category revenue and quantity totals.

pub mod context;
pub mod error;
pub mod input;
pub mod model;
pub mod output;
pub mod standalone;
pub mod utils;
pub mod workload;

pub use context::{GroupedView, InMemoryMapContext, MapContext};
pub use error::{Error, Phase, Result};
pub use model::{CategoryStats, SalesRecord};
pub use standalone::engine::{analyze, rank_by_revenue, MapPhaseRunner, ReducePhaseRunner, ResultMap};
pub use standalone::pool::CancellationFlag;

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// A map function over inputs of type `In`.
///
/// `map` may call [`MapContext::write`] any number of times. The engine calls
/// it from several worker threads at once, on distinct inputs sharing one
/// context, so implementations must not keep per-call state in `self`.
///
/// Returning [`Error::InvalidValue`] drops the input with a warning; any other
/// error aborts the map phase.
pub trait Mapper<In, K, V>: Sync {
    fn map<C>(&self, input: &In, context: &C) -> Result<()>
    where
        C: MapContext<K, V> + ?Sized;
}

/// A reduce function: folds every value emitted under `key` into one output.
///
/// Must not touch shared state. Returning [`Error::InvalidValue`] omits the
/// key from the result with a warning; any other error aborts the reduce phase.
pub trait Reducer<K, V, Out>: Sync {
    fn reduce(&self, key: &K, values: &[V]) -> Result<Out>;
}
