//! Input validation for planning runs.
//!
//! Checks structural integrity of work items and capacity before any slot
//! is committed. Detects:
//! - Duplicate item IDs
//! - Negative or non-finite estimates
//! - Predecessor references to items not in the input
//! - Circular precedence dependencies (DAG validation)
//! - Invalid capacity values or an empty horizon
//!
//! Every problem is collected so callers can report them together.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::HashSet;

use crate::error::PlanningError;
use crate::models::{CapacityTable, WorkItem};
use crate::precedence::PrecedenceGraph;

/// Validation result.
pub type ValidationResult = Result<(), Vec<PlanningError>>;

/// Validates the input of a planning run.
///
/// Checks:
/// 1. Capacity table horizon and values
/// 2. No duplicate item IDs
/// 3. Estimates are finite and non-negative
/// 4. All predecessor references point to existing items
/// 5. No circular precedence dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(items: &[WorkItem], capacity: &CapacityTable) -> ValidationResult {
    let mut errors = Vec::new();

    if let Err(e) = capacity.validate() {
        errors.push(e);
    }

    let mut ids = HashSet::new();
    for item in items {
        if !ids.insert(item.id.as_str()) {
            errors.push(PlanningError::DuplicateItem(item.id.clone()));
        }
        if let Some(hours) = item.estimate_hours {
            if !hours.is_finite() || hours < 0.0 {
                errors.push(PlanningError::InvalidEstimate {
                    item: item.id.clone(),
                    hours,
                });
            }
        }
    }

    let graph = PrecedenceGraph::build(items);
    let unknown = graph.unknown_references();
    for &(item, predecessor) in &unknown {
        errors.push(PlanningError::UnknownPredecessor {
            item: item.to_string(),
            predecessor: predecessor.to_string(),
        });
    }

    // Dangling edges were dropped when the graph was built
    if let Some(members) = graph.find_cycle() {
        errors.push(PlanningError::CyclicDependency { members });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
