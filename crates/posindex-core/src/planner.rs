//! Multi-column predicate planning.
//!
//! Each predicate gets a heuristic selectivity score; lower means fewer
//! expected matches. Predicates run in ascending score order and the
//! running candidate set short-circuits as soon as it is empty. Order only
//! affects speed: the result is the same for any order.
//!
//! ```text
//! score = 1/(concrete+1) - 0.05*underscores + 0.15*partitions - anchors/200
//! ```

use crate::bitmap_store::PositionalBitmapStore;
use crate::config::PlannerConfig;
use crate::error::{Error, Result};
use crate::matcher;
use crate::pattern::{self, CompiledPattern};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pattern-matching operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LikeOp {
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `ILIKE` (ASCII case-insensitive)
    ILike,
    /// `NOT ILIKE`
    NotILike,
}

impl LikeOp {
    /// True for `NOT LIKE` and `NOT ILIKE`.
    #[must_use]
    pub const fn is_negated(self) -> bool {
        matches!(self, Self::NotLike | Self::NotILike)
    }

    /// True for `LIKE` and `NOT LIKE`.
    #[must_use]
    pub const fn is_case_sensitive(self) -> bool {
        matches!(self, Self::Like | Self::NotLike)
    }

    /// SQL spelling of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::ILike => "ILIKE",
            Self::NotILike => "NOT ILIKE",
        }
    }
}

impl fmt::Display for LikeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scan-time predicate: `column op 'pattern'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Zero-based indexed column.
    pub column: usize,
    /// Operator.
    pub op: LikeOp,
    /// Wildcard pattern (`%`, `_`, `\` escapes).
    pub pattern: String,
}

impl Predicate {
    /// Creates a predicate.
    #[must_use]
    pub fn new(column: usize, op: LikeOp, pattern: impl Into<String>) -> Self {
        Self {
            column,
            op,
            pattern: pattern.into(),
        }
    }

    /// `column LIKE pattern`
    #[must_use]
    pub fn like(column: usize, pattern: impl Into<String>) -> Self {
        Self::new(column, LikeOp::Like, pattern)
    }

    /// `column NOT LIKE pattern`
    #[must_use]
    pub fn not_like(column: usize, pattern: impl Into<String>) -> Self {
        Self::new(column, LikeOp::NotLike, pattern)
    }

    /// `column ILIKE pattern`
    #[must_use]
    pub fn ilike(column: usize, pattern: impl Into<String>) -> Self {
        Self::new(column, LikeOp::ILike, pattern)
    }

    /// `column NOT ILIKE pattern`
    #[must_use]
    pub fn not_ilike(column: usize, pattern: impl Into<String>) -> Self {
        Self::new(column, LikeOp::NotILike, pattern)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col{} {} '{}'", self.column, self.op, self.pattern)
    }
}

/// Heuristic selectivity score of a compiled pattern. Lower runs first.
#[must_use]
pub fn selectivity_score(pattern: &CompiledPattern) -> f64 {
    let concrete = pattern.concrete_chars() as f64;
    let underscores = pattern.underscore_count() as f64;
    let partitions = pattern.literal_count() as f64;
    let anchors = f64::from(pattern.anchor_strength());

    1.0 / (concrete + 1.0) - 0.05 * underscores + 0.15 * partitions - anchors / 200.0
}

/// A compiled predicate with its place in the plan.
#[derive(Debug, Clone)]
pub struct PlannedPredicate {
    /// Position in the caller's predicate list.
    pub position: usize,
    /// Indexed column.
    pub column: usize,
    /// Operator.
    pub op: LikeOp,
    /// Compiled pattern.
    pub pattern: CompiledPattern,
    /// Selectivity score.
    pub score: f64,
}

/// Ordered predicates ready to run.
#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
    steps: Vec<PlannedPredicate>,
}

impl QueryPlan {
    /// Predicates in execution order.
    #[must_use]
    pub fn steps(&self) -> &[PlannedPredicate] {
        &self.steps
    }

    /// True when the query has no predicates (matches every live record).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs the plan and returns the matching live slots.
    ///
    /// Each NOT predicate is inverted against `universe` on its own, then
    /// intersected with the running set.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if a step names a column `stores` lacks.
    pub fn execute(
        &self,
        stores: &[PositionalBitmapStore],
        universe: &RoaringBitmap,
    ) -> Result<RoaringBitmap> {
        let mut running = universe.clone();
        for (evaluated, step) in self.steps.iter().enumerate() {
            let store = stores.get(step.column).ok_or(Error::UnknownColumn {
                column: step.column,
                column_count: stores.len(),
            })?;

            if step.op.is_negated() {
                let matched = matcher::evaluate(&step.pattern, store, universe);
                running &= matcher::negate(&matched, universe);
            } else {
                // Scoping to the running set gives the same intersection.
                running = matcher::evaluate(&step.pattern, store, &running);
            }

            if running.is_empty() {
                tracing::debug!(
                    evaluated = evaluated + 1,
                    skipped = self.steps.len() - evaluated - 1,
                    "Candidate set empty, short-circuiting"
                );
                break;
            }
        }
        Ok(running)
    }
}

/// Scores and orders predicates.
#[derive(Debug, Default)]
pub struct QueryPlanner;

impl QueryPlanner {
    /// Compiles every predicate and orders them by selectivity.
    ///
    /// # Arguments
    ///
    /// * `predicates` - Predicates in caller order
    /// * `column_count` - Number of indexed columns
    /// * `config` - Planner settings (`reorder_predicates = false` keeps caller order)
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` for a malformed pattern and `UnknownColumn`
    /// for an out-of-range column. Nothing is evaluated in either case.
    pub fn plan(
        predicates: &[Predicate],
        column_count: usize,
        config: &PlannerConfig,
    ) -> Result<QueryPlan> {
        let mut steps = Vec::with_capacity(predicates.len());
        for (position, predicate) in predicates.iter().enumerate() {
            if predicate.column >= column_count {
                return Err(Error::UnknownColumn {
                    column: predicate.column,
                    column_count,
                });
            }
            let compiled = pattern::compile(&predicate.pattern, predicate.op.is_case_sensitive())?;
            let score = selectivity_score(&compiled);
            steps.push(PlannedPredicate {
                position,
                column: predicate.column,
                op: predicate.op,
                pattern: compiled,
                score,
            });
        }

        if config.reorder_predicates {
            // Stable: ties keep caller order.
            steps.sort_by(|a, b| a.score.total_cmp(&b.score));
        }

        for (order, step) in steps.iter().enumerate() {
            tracing::debug!(
                order,
                position = step.position,
                column = step.column,
                op = step.op.as_str(),
                shape = step.pattern.shape().as_str(),
                score = step.score,
                "Planned predicate"
            );
        }

        Ok(QueryPlan { steps })
    }
}
