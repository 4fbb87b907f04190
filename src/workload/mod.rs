//! MapReduce applications that run on the standalone engine.
//!
//! # Example
//!
//! ```
//! # use salesmr::Result;
//! use salesmr::workload::sales::{SalesMapper, SalesReducer};
//! use salesmr::{CategoryStats, InMemoryMapContext, MapPhaseRunner, ReducePhaseRunner, SalesRecord};
//! # fn main() -> Result<()> {
//! let records = vec![SalesRecord::new(1, 10, "Books", "12.50".parse().unwrap(), 2)?];
//! let context: InMemoryMapContext<String, CategoryStats> = InMemoryMapContext::new();
//! MapPhaseRunner::new(4)?.run(&records, &SalesMapper, &context)?;
//! let totals = ReducePhaseRunner::new(4)?.run_reduce(&context.into_grouped_view(), &SalesReducer)?;
//! assert_eq!(totals["Books"].total_quantity(), 2);
//! # Ok(())
//! # }
//! ```

pub mod sales;
