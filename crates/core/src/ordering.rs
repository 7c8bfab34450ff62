//! Step ordering within a tour.
//!
//! Every tour keeps its steps at `step_order` values exactly `1..=N`. The
//! functions here compute which orders to write; the lifecycle service in
//! `tourflow-db` applies them to the store.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::types::DbId;

/// A single `step_order` write: set step `step_id` to position `order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAssignment {
    pub step_id: DbId,
    pub order: i32,
}

/// Order for a step appended to a tour whose highest order is `max_order`.
pub fn next_step_order(max_order: Option<i32>) -> i32 {
    max_order.map_or(1, |max| max + 1)
}

/// Orders for the steps supplied at tour creation, in input order.
pub fn initial_orders(count: usize) -> impl Iterator<Item = i32> {
    (1..).take(count)
}

/// Close gaps in a tour's ordering.
///
/// `steps` is `(step_id, current_order)` already sorted by current order.
/// Returns the assignments that rewrite positions to `1..=M` by array
/// position, skipping steps already at their target.
pub fn renumber(steps: &[(DbId, i32)]) -> Vec<OrderAssignment> {
    steps
        .iter()
        .zip(1..)
        .filter(|((_, current), target)| current != target)
        .map(|(&(step_id, _), order)| OrderAssignment { step_id, order })
        .collect()
}

/// Assign `1..=N` to `step_ids` by array position.
///
/// No check is made that the list covers the tour; pair it with
/// [`validate_permutation`] unless the caller is trusted.
pub fn reorder(step_ids: &[DbId]) -> Vec<OrderAssignment> {
    step_ids
        .iter()
        .zip(1..)
        .map(|(&step_id, order)| OrderAssignment { step_id, order })
        .collect()
}

/// Check that `requested` is exactly a permutation of `current`.
pub fn validate_permutation(current: &[DbId], requested: &[DbId]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(requested.len());
    if let Some(dup) = requested.iter().find(|id| !seen.insert(**id)) {
        return Err(CoreError::Validation(format!(
            "Step {dup} appears more than once in the new order"
        )));
    }

    let current_set: HashSet<DbId> = current.iter().copied().collect();
    let mut unknown: Vec<DbId> = seen.difference(&current_set).copied().collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        return Err(CoreError::Validation(format!(
            "Steps {unknown:?} do not belong to this tour"
        )));
    }

    let mut missing: Vec<DbId> = current_set.difference(&seen).copied().collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(CoreError::Validation(format!(
            "New order is missing steps {missing:?}"
        )));
    }

    Ok(())
}

/// True when `orders` is exactly `{1, ..., n}` with no gaps or duplicates.
pub fn is_contiguous(orders: impl IntoIterator<Item = i32>) -> bool {
    let mut sorted: Vec<i32> = orders.into_iter().collect();
    sorted.sort_unstable();
    sorted.iter().zip(1..).all(|(&order, expected)| order == expected)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
