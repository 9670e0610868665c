//! Per-run planning state.
//!
//! Holds the precedence graph, the ledger, and the outcome of every item
//! while the passes run, and assembles the final [`PlanningResult`].

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use tracing::{debug, warn};

use crate::error::PlanResult;
use crate::models::{
    AssignmentLedger, ItemAssignment, PlacementPass, PlanningResult, Unassignable,
    UnassignableReason, WorkItem,
};
use crate::precedence::PrecedenceGraph;

/// Outcome of one item so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Outcome {
    /// Not decided yet.
    Pending,
    /// Committed to a slot of `pool`.
    Placed { slot: usize, pass: PlacementPass },
    /// Left out of the plan.
    Failed(UnassignableReason),
}

impl Outcome {
    fn is_settled(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

/// Mutable state of one planning run.
pub(crate) struct PlanState<'a> {
    pub(crate) graph: PrecedenceGraph<'a>,
    pub(crate) ledger: AssignmentLedger,
    outcomes: Vec<Outcome>,
    /// Pool charged per placed item, when it differs from the item's own.
    charged_to: HashMap<usize, &'a str>,
}

impl<'a> PlanState<'a> {
    pub(crate) fn new(graph: PrecedenceGraph<'a>, ledger: AssignmentLedger) -> Self {
        let outcomes = vec![Outcome::Pending; graph.len()];
        Self {
            graph,
            ledger,
            outcomes,
            charged_to: HashMap::new(),
        }
    }

    pub(crate) fn outcome(&self, idx: usize) -> Outcome {
        self.outcomes[idx]
    }

    pub(crate) fn item(&self, idx: usize) -> &'a WorkItem {
        self.graph.item(idx)
    }

    pub(crate) fn slot_of(&self, idx: usize) -> Option<usize> {
        match self.outcomes[idx] {
            Outcome::Placed { slot, .. } => Some(slot),
            _ => None,
        }
    }

    /// Indices of items still pending.
    pub(crate) fn pending(&self) -> Vec<usize> {
        (0..self.outcomes.len())
            .filter(|&i| self.outcomes[i] == Outcome::Pending)
            .collect()
    }

    /// Whether every predecessor has a final outcome.
    pub(crate) fn predecessors_settled(&self, idx: usize) -> bool {
        self.graph
            .predecessors_resolved(idx, |p| self.outcomes[p].is_settled())
    }

    /// Whether every predecessor is placed.
    pub(crate) fn predecessors_placed(&self, idx: usize) -> bool {
        self.graph
            .predecessors_resolved(idx, |p| self.slot_of(p).is_some())
    }

    /// Earliest slot allowed by the placed predecessors.
    pub(crate) fn earliest_slot(&self, idx: usize) -> usize {
        self.graph.earliest_slot(idx, |p| self.slot_of(p))
    }

    /// Commits an item to the first slot of `pool` at or after its earliest slot.
    ///
    /// All predecessors must be settled. Failure reasons are checked in
    /// order: failed predecessor, horizon, capacity.
    pub(crate) fn place(&mut self, idx: usize, pool: &'a str, pass: PlacementPass) -> Outcome {
        debug_assert!(self.predecessors_settled(idx));
        let item = self.graph.item(idx);

        let outcome = if !self.predecessors_placed(idx) {
            Outcome::Failed(UnassignableReason::BlockedByUnassignable)
        } else {
            let earliest = self.earliest_slot(idx);
            let hours = item.cost_hours();
            if earliest > self.ledger.horizon() {
                Outcome::Failed(UnassignableReason::PrecedenceExceedsHorizon)
            } else {
                let slot = self
                    .ledger
                    .first_fit(pool, earliest, hours)
                    .filter(|&slot| self.ledger.try_commit(pool, slot, hours));
                match slot {
                    Some(slot) => {
                        debug!(
                            item = %item.id,
                            pool,
                            slot,
                            hours,
                            remaining = self.ledger.remaining(pool, slot),
                            "work item committed"
                        );
                        Outcome::Placed { slot, pass }
                    }
                    None => Outcome::Failed(UnassignableReason::CapacityExhausted),
                }
            }
        };

        self.record(idx, pool, outcome);
        outcome
    }

    /// Commits an item to exactly `slot` of `pool` if it fits. Used by the absorber.
    pub(crate) fn place_at(&mut self, idx: usize, pool: &'a str, slot: usize) -> bool {
        let item = self.graph.item(idx);
        if !self.ledger.try_commit(pool, slot, item.cost_hours()) {
            return false;
        }
        debug!(item = %item.id, pool, slot, "work item absorbed");
        self.record(
            idx,
            pool,
            Outcome::Placed {
                slot,
                pass: PlacementPass::Absorbed,
            },
        );
        true
    }

    /// Marks an item as left out.
    pub(crate) fn fail(&mut self, idx: usize, reason: UnassignableReason) {
        let pool = self.graph.item(idx).pool();
        self.record(idx, pool, Outcome::Failed(reason));
    }

    fn record(&mut self, idx: usize, pool: &'a str, outcome: Outcome) {
        let item = self.graph.item(idx);
        if let Outcome::Failed(reason) = outcome {
            warn!(item = %item.id, pool, ?reason, "work item unassignable");
        }
        if pool != item.pool() {
            self.charged_to.insert(idx, pool);
        } else {
            self.charged_to.remove(&idx);
        }
        self.outcomes[idx] = outcome;
    }

    /// Places `candidates` predecessor-first, lowest `(priority, id)` first.
    ///
    /// An item becomes ready once all predecessors are settled. Items
    /// waiting on predecessors outside `candidates` that are still pending
    /// stay pending. Returns how many items were settled.
    pub(crate) fn settle(&mut self, candidates: &[usize], pass: PlacementPass) -> usize {
        let mut waiting: HashMap<usize, usize> = candidates
            .iter()
            .filter(|&&i| self.outcomes[i] == Outcome::Pending)
            .map(|&i| {
                let unsettled = self
                    .graph
                    .blocked_by(i)
                    .iter()
                    .filter(|&&p| !self.outcomes[p].is_settled())
                    .count();
                (i, unsettled)
            })
            .collect();

        let mut ready: BinaryHeap<_> = waiting
            .iter()
            .filter(|&(_, &w)| w == 0)
            .map(|(&i, _)| Reverse(self.graph.order_entry(i)))
            .collect();

        let mut settled = 0;
        while let Some(Reverse((_, _, idx))) = ready.pop() {
            waiting.remove(&idx);
            let pool = self.graph.item(idx).pool();
            self.place(idx, pool, pass);
            settled += 1;

            for &succ in self.graph.blocks(idx) {
                if let Some(w) = waiting.get_mut(&succ) {
                    *w -= 1;
                    if *w == 0 {
                        ready.push(Reverse(self.graph.order_entry(succ)));
                    }
                }
            }
        }
        settled
    }

    /// Verifies the ledger and builds the immutable result.
    pub(crate) fn into_result(self) -> PlanResult<PlanningResult> {
        self.ledger.verify()?;

        let mut assignments = BTreeMap::new();
        let mut unassignable = Vec::new();

        for (idx, outcome) in self.outcomes.iter().enumerate() {
            let item = self.graph.item(idx);
            let pool = self
                .charged_to
                .get(&idx)
                .copied()
                .unwrap_or_else(|| item.pool());
            let (slot, pass) = match *outcome {
                Outcome::Placed { slot, pass } => (Some(slot), Some(pass)),
                Outcome::Failed(reason) => {
                    unassignable.push(Unassignable {
                        item_id: item.id.clone(),
                        reason,
                    });
                    (None, None)
                }
                // Every pass settles what it touches; anything left is blocked upstream.
                Outcome::Pending => {
                    unassignable.push(Unassignable {
                        item_id: item.id.clone(),
                        reason: UnassignableReason::BlockedByUnassignable,
                    });
                    (None, None)
                }
            };
            assignments.insert(
                item.id.clone(),
                ItemAssignment {
                    item_id: item.id.clone(),
                    pool: pool.to_string(),
                    slot,
                    pass,
                    hours: item.cost_hours(),
                },
            );
        }
        unassignable.sort_by(|a, b| a.item_id.cmp(&b.item_id));

        Ok(PlanningResult {
            horizon: self.ledger.horizon(),
            assignments,
            ledger: self.ledger.entries(),
            unassignable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanningError;
    use crate::models::{CapacityTable, Priority};

    fn state<'a>(items: &'a [WorkItem], capacity: &CapacityTable) -> PlanState<'a> {
        let ledger = AssignmentLedger::open(capacity, items.iter().map(WorkItem::pool));
        PlanState::new(PrecedenceGraph::build(items), ledger)
    }

    #[test]
    fn test_place_first_fit() {
        let items = vec![
            WorkItem::new("A").with_estimate(6.0).with_assignee("ann"),
            WorkItem::new("B").with_estimate(6.0).with_assignee("ann"),
        ];
        let capacity = CapacityTable::new(2).with_default_hours("ann", 10.0);
        let mut s = state(&items, &capacity);

        assert_eq!(
            s.place(0, "ann", PlacementPass::Primary),
            Outcome::Placed {
                slot: 1,
                pass: PlacementPass::Primary
            }
        );
        s.place(1, "ann", PlacementPass::Primary);
        assert_eq!(s.slot_of(1), Some(2));
        assert!(s.pending().is_empty());
    }

    #[test]
    fn test_place_reports_horizon_before_capacity() {
        let items = vec![
            WorkItem::new("A").with_estimate(1.0).with_assignee("ann"),
            WorkItem::new("B")
                .with_estimate(50.0)
                .with_assignee("ann")
                .with_blocker("A"),
        ];
        let capacity = CapacityTable::new(1).with_default_hours("ann", 10.0);
        let mut s = state(&items, &capacity);
        s.place(0, "ann", PlacementPass::Primary);
        assert_eq!(
            s.place(1, "ann", PlacementPass::Primary),
            Outcome::Failed(UnassignableReason::PrecedenceExceedsHorizon)
        );
    }

    #[test]
    fn test_failed_predecessor_blocks_dependent() {
        let items = vec![
            WorkItem::new("A").with_estimate(99.0).with_assignee("ann"),
            WorkItem::new("B")
                .with_estimate(1.0)
                .with_assignee("ann")
                .with_blocker("A"),
        ];
        let capacity = CapacityTable::new(3).with_default_hours("ann", 10.0);
        let mut s = state(&items, &capacity);
        assert_eq!(s.settle(&[0, 1], PlacementPass::Primary), 2);
        assert_eq!(
            s.outcome(0),
            Outcome::Failed(UnassignableReason::CapacityExhausted)
        );
        assert_eq!(
            s.outcome(1),
            Outcome::Failed(UnassignableReason::BlockedByUnassignable)
        );
    }

    #[test]
    fn test_settle_waits_on_outside_predecessor() {
        let items = vec![
            WorkItem::new("A").with_estimate(1.0).with_assignee("zed"),
            WorkItem::new("B")
                .with_estimate(1.0)
                .with_assignee("ann")
                .with_blocker("A"),
            WorkItem::new("C")
                .with_estimate(1.0)
                .with_assignee("ann")
                .with_blocker("B"),
        ];
        let capacity = CapacityTable::new(5).with_fallback_hours(10.0);
        let mut s = state(&items, &capacity);

        assert_eq!(s.settle(&[1, 2], PlacementPass::Primary), 0);
        assert_eq!(s.pending(), vec![0, 1, 2]);

        assert_eq!(s.settle(&[0], PlacementPass::Primary), 1);
        assert_eq!(s.settle(&[1, 2], PlacementPass::Deferred), 2);
        assert_eq!(s.slot_of(1), Some(2));
        assert_eq!(s.slot_of(2), Some(3));
    }

    #[test]
    fn test_settle_orders_ready_items_by_priority() {
        let items = vec![
            WorkItem::new("root").with_estimate(1.0).with_assignee("ann"),
            WorkItem::new("b-low")
                .with_estimate(5.0)
                .with_priority(Priority::Low)
                .with_assignee("ann")
                .with_blocker("root"),
            WorkItem::new("a-high")
                .with_estimate(5.0)
                .with_priority(Priority::High)
                .with_assignee("ann")
                .with_blocker("root"),
        ];
        let capacity = CapacityTable::new(3).with_default_hours("ann", 6.0);
        let mut s = state(&items, &capacity);
        s.settle(&[0, 1, 2], PlacementPass::Primary);
        assert_eq!(s.slot_of(0), Some(1));
        assert_eq!(s.slot_of(2), Some(2));
        assert_eq!(s.slot_of(1), Some(3));
    }

    #[test]
    fn test_place_at_charges_other_pool() {
        let items = vec![WorkItem::new("U").with_estimate(3.0)];
        let capacity = CapacityTable::new(2).with_default_hours("fill", 4.0);
        let ledger = AssignmentLedger::open(&capacity, ["fill", "Unassigned"]);
        let mut s = PlanState::new(PrecedenceGraph::build(&items), ledger);

        assert!(s.place_at(0, "fill", 2));
        let result = s.into_result().unwrap();
        let a = &result.assignments["U"];
        assert_eq!(a.pool, "fill");
        assert_eq!(a.slot, Some(2));
        assert_eq!(a.pass, Some(PlacementPass::Absorbed));
        assert!((result.remaining_hours("fill", 2) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_into_result_fails_on_overcommit() {
        let items = vec![WorkItem::new("A").with_estimate(1.0).with_assignee("ann")];
        let capacity = CapacityTable::new(1).with_default_hours("ann", 2.0);
        let mut s = state(&items, &capacity);
        s.ledger.force_commit("ann", 1, 5.0);
        let err = s.into_result().unwrap_err();
        assert!(matches!(err, PlanningError::CapacityInvariant { .. }));
    }
}
