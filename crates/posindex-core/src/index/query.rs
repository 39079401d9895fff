//! Scan-time entry points.

use super::PatternIndex;
use crate::error::Result;
use crate::materialize::{materialize, MaterializeOptions, QueryResults};
use crate::planner::{Predicate, QueryPlanner};
use roaring::RoaringBitmap;

impl PatternIndex {
    /// Locators of the live records matching every predicate.
    ///
    /// With no predicates every live record matches. The returned iterator
    /// borrows the index; dropping it early is how a scan is cancelled.
    ///
    /// # Errors
    ///
    /// `InvalidPattern` or `UnknownColumn` before any evaluation,
    /// `InconsistentState` if the index is poisoned. No partial results.
    pub fn query(
        &self,
        predicates: &[Predicate],
        options: MaterializeOptions,
    ) -> Result<QueryResults<'_>> {
        let candidates = self.query_bitmap(predicates)?;
        Ok(materialize(
            candidates,
            &self.slots,
            options,
            &self.config.materialize,
        ))
    }

    /// Matching slots as a bitmap, for hosts doing their own bitmap scans.
    ///
    /// # Errors
    ///
    /// Same as [`query`](Self::query).
    pub fn query_bitmap(&self, predicates: &[Predicate]) -> Result<RoaringBitmap> {
        self.ensure_consistent()?;
        let plan = QueryPlanner::plan(predicates, self.columns.len(), &self.config.planner)?;
        let result = plan.execute(&self.columns, self.slots.live())?;
        tracing::debug!(
            predicates = predicates.len(),
            matches = result.len(),
            "Query evaluated"
        );
        Ok(result)
    }

    /// Number of matching records, without resolving locators.
    ///
    /// # Errors
    ///
    /// Same as [`query`](Self::query).
    pub fn count(&self, predicates: &[Predicate]) -> Result<u64> {
        Ok(self.query_bitmap(predicates)?.len())
    }
}
