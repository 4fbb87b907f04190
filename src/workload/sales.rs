//! Per-category sales totals.
//!
//! The mapper turns every transaction into a one-record [`CategoryStats`]
//! keyed by its category; the reducer sums them.

use crate::model::{CategoryStats, SalesRecord};
use crate::{MapContext, Mapper, Reducer, Result};

pub struct SalesMapper;

impl Mapper<SalesRecord, String, CategoryStats> for SalesMapper {
    fn map<C>(&self, record: &SalesRecord, context: &C) -> Result<()>
    where
        C: MapContext<String, CategoryStats> + ?Sized,
    {
        let revenue = record.revenue()?;
        context.write(
            record.category().to_string(),
            CategoryStats::new(revenue, i64::from(record.quantity())),
        );
        Ok(())
    }
}

pub struct SalesReducer;

impl Reducer<String, CategoryStats, CategoryStats> for SalesReducer {
    /// Left fold of [`CategoryStats::checked_add`] starting at the identity,
    /// so an empty group yields [`CategoryStats::empty`].
    fn reduce(&self, _category: &String, values: &[CategoryStats]) -> Result<CategoryStats> {
        values
            .iter()
            .try_fold(CategoryStats::empty(), |total, stats| total.checked_add(stats))
    }
}
