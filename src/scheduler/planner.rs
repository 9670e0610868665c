//! Sprint capacity planner.
//!
//! # Algorithm
//!
//! 1. Validate input (duplicates, estimates, references, cycles, capacity).
//! 2. Partition items by pool. Pools run in lexical order; the fill pool
//!    runs last so its backlog only claims what the others left.
//! 3. Within a pool, items without predecessors go first in
//!    `(priority, id)` order, each committed to the first slot that fits.
//! 4. Items with predecessors follow in priority-driven topological order:
//!    the lowest `(priority, id)` among items whose predecessors are settled
//!    goes next, starting its scan at `1 + max(predecessor slot)`.
//! 5. Items whose predecessors lived in later pools settle next, against
//!    their own pool.
//! 6. The overflow absorber fills gaps in the fill pool's slots, so the
//!    absorbed backlog only takes what assigned items left.
//! 7. Items with no assignee that were not absorbed become unassignable,
//!    and their dependents settle.
//! 8. The ledger is re-verified and the result assembled.
//!
//! Items are never split: an item fits a slot whole or not at all.
//!
//! # Complexity
//! O(n log n + n * h + e) where n=items, h=horizon slots, e=precedence edges.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, info_span, warn};

use super::absorber::OverflowAbsorber;
use super::state::PlanState;
use crate::config::PlannerConfig;
use crate::error::PlanResult;
use crate::models::{
    AssignmentLedger, CapacityTable, PlacementPass, PlanningResult, UnassignableReason, WorkItem,
    UNASSIGNED_POOL,
};
use crate::precedence::PrecedenceGraph;
use crate::validation::validate_input;

/// Input container for one planning run.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// Items to plan.
    pub items: Vec<WorkItem>,
    /// Capacity per (assignee, slot).
    pub capacity: CapacityTable,
}

impl PlanRequest {
    /// Creates a new request.
    pub fn new(items: Vec<WorkItem>, capacity: CapacityTable) -> Self {
        Self { items, capacity }
    }

    /// Creates a request whose capacity comes from `config`.
    pub fn from_config(items: Vec<WorkItem>, config: &PlannerConfig) -> Self {
        Self::new(items, config.capacity_table())
    }
}

/// Precedence-aware, priority-driven sprint planner.
///
/// Holds only settings; each call to [`plan`](Self::plan) builds its own
/// graph and ledger, so one planner can serve concurrent runs.
///
/// # Example
///
/// ```
/// use u_sprint::models::{CapacityTable, Priority, WorkItem};
/// use u_sprint::scheduler::SprintPlanner;
///
/// let items = vec![
///     WorkItem::new("A").with_estimate(6.0).with_priority(Priority::Highest).with_assignee("ann"),
///     WorkItem::new("B").with_estimate(8.0).with_priority(Priority::High).with_assignee("ann").with_blocker("A"),
/// ];
/// let capacity = CapacityTable::new(2).with_default_hours("ann", 10.0);
///
/// let result = SprintPlanner::new().plan(&items, &capacity).unwrap();
/// assert_eq!(result.slot_of("A"), Some(1));
/// assert_eq!(result.slot_of("B"), Some(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SprintPlanner {
    fill_assignee: Option<String>,
    absorb_unassigned: bool,
}

impl SprintPlanner {
    /// Creates a planner with no fill pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a planner from configuration.
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            fill_assignee: config.fill_assignee.clone(),
            absorb_unassigned: config.absorb_unassigned,
        }
    }

    /// Sets the fill pool, scheduled last and used by the overflow absorber.
    pub fn with_fill_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.fill_assignee = Some(assignee.into());
        self
    }

    /// Lets the fill pool absorb items with no assignee.
    pub fn with_absorb_unassigned(mut self, absorb: bool) -> Self {
        self.absorb_unassigned = absorb;
        self
    }

    /// The configured fill pool.
    pub fn fill_assignee(&self) -> Option<&str> {
        self.fill_assignee.as_deref()
    }

    /// Plans `items` against `capacity`.
    ///
    /// # Errors
    /// Configuration errors (cycle, unknown predecessor, duplicate id,
    /// invalid estimate or capacity) abort before any slot is committed.
    /// When several are present the first is returned and the rest are
    /// logged. [`PlanningError::CapacityInvariant`](crate::error::PlanningError::CapacityInvariant)
    /// signals a scheduler defect.
    pub fn plan(&self, items: &[WorkItem], capacity: &CapacityTable) -> PlanResult<PlanningResult> {
        let span = info_span!("plan", items = items.len(), horizon = capacity.horizon());
        let _enter = span.enter();

        if let Err(mut errors) = validate_input(items, capacity) {
            for extra in errors.iter().skip(1) {
                warn!(error = %extra, "additional planning input error");
            }
            return Err(errors.remove(0));
        }

        let fill = self.fill_assignee.as_deref();
        let mut pools: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, item) in items.iter().enumerate() {
            pools.entry(item.pool()).or_default().push(idx);
        }

        let ledger_pools: BTreeSet<&str> = pools
            .keys()
            .copied()
            .chain(capacity.configured_assignees())
            .chain(fill)
            .collect();
        let ledger = AssignmentLedger::open(capacity, ledger_pools);
        let mut state = PlanState::new(PrecedenceGraph::build(items), ledger);

        for (&pool, members) in &pools {
            if pool == UNASSIGNED_POOL || Some(pool) == fill {
                continue;
            }
            run_pool(&mut state, pool, members);
        }

        if let Some((&pool, members)) = fill.and_then(|f| pools.get_key_value(f)) {
            run_pool(&mut state, pool, members);
        }

        // Assigned backlog claims its own pool before the absorber runs
        settle_deferred(&mut state);

        if let Some(fill) = fill {
            OverflowAbsorber::new(fill)
                .with_unassigned(self.absorb_unassigned)
                .absorb(&mut state);
        }

        if let Some(members) = pools.get(UNASSIGNED_POOL) {
            for &idx in members {
                if state.slot_of(idx).is_none() {
                    state.fail(idx, UnassignableReason::NoAssignee);
                }
            }
        }

        // Dependents of items with no assignee
        settle_deferred(&mut state);

        let result = state.into_result()?;
        info!(
            assigned = result.assigned_count(),
            unassignable = result.unassignable.len(),
            pools = pools.len(),
            "planning run finished"
        );
        Ok(result)
    }

    /// Plans a request.
    pub fn plan_request(&self, request: &PlanRequest) -> PlanResult<PlanningResult> {
        self.plan(&request.items, &request.capacity)
    }
}

/// Settles pending items that have an assignee, against their own pool.
///
/// Items with no assignee are left for the absorber; anything waiting on
/// them stays pending.
fn settle_deferred(state: &mut PlanState<'_>) {
    let pending: Vec<usize> = state
        .pending()
        .into_iter()
        .filter(|&i| !state.item(i).is_unassigned())
        .collect();
    if !pending.is_empty() {
        let settled = state.settle(&pending, PlacementPass::Deferred);
        debug!(deferred = pending.len(), settled, "deferred items settled");
    }
}

/// One pool's item-first pass: leaves, then dependents.
fn run_pool<'a>(state: &mut PlanState<'a>, pool: &'a str, members: &[usize]) {
    let (mut leaves, dependents): (Vec<usize>, Vec<usize>) = members
        .iter()
        .copied()
        .partition(|&i| !state.item(i).has_blockers());
    leaves.sort_by_key(|&i| state.graph.order_entry(i));

    for &idx in &leaves {
        state.place(idx, pool, PlacementPass::Primary);
    }
    let settled = state.settle(&dependents, PlacementPass::Primary);

    debug!(
        pool,
        leaves = leaves.len(),
        dependents = dependents.len(),
        deferred = dependents.len() - settled,
        "pool pass finished"
    );
}
