// crates/gateway-workspace-core/src/runtime/fanout.rs
// ============================================================================
// Module: Gateway Workspace Fan-Out
// Description: Bounded "apply all, collect errors, report first" combinator.
// Purpose: Run independent reference updates of one cascade in parallel.
// Dependencies: std::thread, crate::interfaces
// ============================================================================

//! ## Overview
//! A cascade touches N referencing records independently. [`FanOut`] runs
//! every update, never stopping at the first failure, and reports how many
//! succeeded together with the first failure in item order. There is no
//! rollback: a failed fan-out leaves successful updates applied.
//!
//! Parallelism is bounded by scoped worker threads pulling from a shared
//! queue; with a bound of one (or at most one item) updates run inline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::PoisonError;
use std::thread;

use thiserror::Error;

use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default worker bound for cascades.
pub const DEFAULT_MAX_PARALLELISM: usize = 4;

/// Upper worker bound accepted from configuration.
pub const MAX_PARALLELISM_LIMIT: usize = 64;

// ============================================================================
// SECTION: Failure Report
// ============================================================================

/// Outcome of a fan-out in which at least one item failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{failed} of {attempted} updates failed ({applied} applied): {first_error}")]
pub struct CascadeFailure {
    /// Items whose operation succeeded.
    pub applied: usize,
    /// Items attempted (always every item).
    pub attempted: usize,
    /// Items whose operation failed.
    pub failed: usize,
    /// First failure in item order.
    pub first_error: StoreError,
}

// ============================================================================
// SECTION: Fan-Out
// ============================================================================

/// Bounded fan-out / fan-in combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOut {
    /// Maximum concurrent workers (at least one).
    max_parallelism: usize,
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARALLELISM)
    }
}

impl FanOut {
    /// Creates a combinator; the bound is clamped to `1 ..= 64`.
    #[must_use]
    pub fn new(max_parallelism: usize) -> Self {
        Self {
            max_parallelism: max_parallelism.clamp(1, MAX_PARALLELISM_LIMIT),
        }
    }

    /// Creates a combinator that runs every item inline, in order.
    #[must_use]
    pub const fn sequential() -> Self {
        Self {
            max_parallelism: 1,
        }
    }

    /// Returns the worker bound.
    #[must_use]
    pub const fn max_parallelism(&self) -> usize {
        self.max_parallelism
    }

    /// Applies `op` to every item and returns the number applied.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeFailure`] when any item failed. Every item is still
    /// attempted; successes are not undone.
    pub fn apply_all<T, F>(&self, items: Vec<T>, op: F) -> Result<usize, CascadeFailure>
    where
        T: Send,
        F: Fn(T) -> Result<(), StoreError> + Sync,
    {
        let attempted = items.len();
        let workers = self.max_parallelism.min(attempted);
        let outcomes = if workers <= 1 {
            items.into_iter().map(&op).collect()
        } else {
            run_parallel(items, &op, workers)
        };
        summarize(attempted, outcomes)
    }
}

/// Runs items on `workers` scoped threads and returns outcomes in item order.
fn run_parallel<T, F>(items: Vec<T>, op: &F, workers: usize) -> Vec<Result<(), StoreError>>
where
    T: Send,
    F: Fn(T) -> Result<(), StoreError> + Sync,
{
    let total = items.len();
    let queue = Mutex::new(items.into_iter().enumerate());
    let finished = Mutex::new(Vec::with_capacity(total));
    thread::scope(|scope| {
        for _ in 0 .. workers {
            scope.spawn(|| {
                loop {
                    let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                    let Some((index, item)) = next else {
                        break;
                    };
                    let outcome = op(item);
                    finished.lock().unwrap_or_else(PoisonError::into_inner).push((index, outcome));
                }
            });
        }
    });
    let mut finished = finished.into_inner().unwrap_or_else(PoisonError::into_inner);
    finished.sort_by_key(|(index, _)| *index);
    finished.into_iter().map(|(_, outcome)| outcome).collect()
}

/// Folds per-item outcomes into the fan-out result.
fn summarize(
    attempted: usize,
    outcomes: Vec<Result<(), StoreError>>,
) -> Result<usize, CascadeFailure> {
    let mut applied = 0;
    let mut failed = 0;
    let mut first_error = None;
    for outcome in outcomes {
        match outcome {
            Ok(()) => applied += 1,
            Err(err) => {
                failed += 1;
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        None => Ok(applied),
        Some(first_error) => Err(CascadeFailure {
            applied,
            attempted,
            failed,
            first_error,
        }),
    }
}
