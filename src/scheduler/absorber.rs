//! Overflow absorber.
//!
//! Capacity-first post-pass for the fill pool. Where the item-first passes
//! walk items and look for a slot, the absorber walks slots in increasing
//! order and looks for items that fit the fill pool's leftover hours.
//!
//! Candidates are the fill pool's own unplaced items and, when enabled,
//! items with no assignee. A candidate is only taken once every predecessor
//! sits in a strictly earlier slot. Committed items are never moved.

use tracing::debug;

use super::state::{Outcome, PlanState};
use crate::models::UnassignableReason;

/// Fills leftover fill-pool capacity with still-unplaced backlog items.
#[derive(Debug, Clone)]
pub(crate) struct OverflowAbsorber<'c> {
    fill_pool: &'c str,
    include_unassigned: bool,
}

impl<'c> OverflowAbsorber<'c> {
    /// Creates an absorber for `fill_pool`.
    pub(crate) fn new(fill_pool: &'c str) -> Self {
        Self {
            fill_pool,
            include_unassigned: false,
        }
    }

    /// Also absorbs items with no assignee.
    pub(crate) fn with_unassigned(mut self, include: bool) -> Self {
        self.include_unassigned = include;
        self
    }

    /// Runs the pass. Returns the number of items absorbed.
    pub(crate) fn absorb<'a>(&self, state: &mut PlanState<'a>) -> usize
    where
        'c: 'a,
    {
        let mut candidates: Vec<usize> = (0..state.graph.len())
            .filter(|&i| self.is_candidate(state, i))
            .collect();
        candidates.sort_by_key(|&i| state.graph.order_entry(i));

        if candidates.is_empty() {
            return 0;
        }

        let mut absorbed = 0;
        for slot in 1..=state.ledger.horizon() {
            for &idx in &candidates {
                if state.slot_of(idx).is_some()
                    || !state.predecessors_placed(idx)
                    || state.earliest_slot(idx) > slot
                {
                    continue;
                }
                if state.place_at(idx, self.fill_pool, slot) {
                    absorbed += 1;
                }
            }
        }

        debug!(
            fill_pool = self.fill_pool,
            candidates = candidates.len(),
            absorbed,
            "overflow absorption finished"
        );
        absorbed
    }

    fn is_candidate(&self, state: &PlanState<'_>, idx: usize) -> bool {
        let item = state.item(idx);
        match state.outcome(idx) {
            Outcome::Placed { .. } => false,
            Outcome::Failed(UnassignableReason::BlockedByUnassignable) => false,
            Outcome::Failed(_) | Outcome::Pending if item.pool() == self.fill_pool => true,
            Outcome::Failed(UnassignableReason::NoAssignee) | Outcome::Pending => {
                self.include_unassigned && item.is_unassigned()
            }
            Outcome::Failed(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AssignmentLedger, CapacityTable, PlacementPass, Priority, WorkItem, UNASSIGNED_POOL,
    };
    use crate::precedence::PrecedenceGraph;

    fn state<'a>(items: &'a [WorkItem], capacity: &CapacityTable) -> PlanState<'a> {
        let ledger = AssignmentLedger::open(capacity, ["fill", "ann", UNASSIGNED_POOL]);
        PlanState::new(PrecedenceGraph::build(items), ledger)
    }

    #[test]
    fn test_absorbs_unassigned_into_gaps() {
        let items = vec![
            WorkItem::new("F1").with_estimate(7.0).with_assignee("fill"),
            WorkItem::new("U1").with_estimate(3.0).with_priority(Priority::High),
            WorkItem::new("U2").with_estimate(4.0).with_priority(Priority::Low),
        ];
        let capacity = CapacityTable::new(2).with_default_hours("fill", 10.0);
        let mut s = state(&items, &capacity);
        s.place(0, "fill", PlacementPass::Primary);

        let absorbed = OverflowAbsorber::new("fill")
            .with_unassigned(true)
            .absorb(&mut s);
        assert_eq!(absorbed, 2);
        // Slot 1 has 3h left: U1 fits, U2 spills to slot 2
        assert_eq!(s.slot_of(1), Some(1));
        assert_eq!(s.slot_of(2), Some(2));
        assert!((s.ledger.remaining("fill", 1) - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_unassigned_ignored_unless_enabled() {
        let items = vec![WorkItem::new("U1").with_estimate(1.0)];
        let capacity = CapacityTable::new(2).with_default_hours("fill", 10.0);
        let mut s = state(&items, &capacity);
        assert_eq!(OverflowAbsorber::new("fill").absorb(&mut s), 0);
        assert_eq!(s.outcome(0), Outcome::Pending);
    }

    #[test]
    fn test_never_exceeds_fill_capacity() {
        let items = vec![
            WorkItem::new("U1").with_estimate(6.0),
            WorkItem::new("U2").with_estimate(6.0),
            WorkItem::new("U3").with_estimate(6.0),
        ];
        let capacity = CapacityTable::new(2).with_default_hours("fill", 10.0);
        let mut s = state(&items, &capacity);
        let absorbed = OverflowAbsorber::new("fill")
            .with_unassigned(true)
            .absorb(&mut s);
        assert_eq!(absorbed, 2);
        assert_eq!(s.outcome(2), Outcome::Pending);
        assert!(s.ledger.verify().is_ok());
    }

    #[test]
    fn test_respects_predecessor_slot() {
        let items = vec![
            WorkItem::new("A").with_estimate(2.0).with_assignee("ann"),
            WorkItem::new("U").with_estimate(1.0).with_blocker("A"),
        ];
        let capacity = CapacityTable::new(3)
            .with_default_hours("fill", 10.0)
            .with_slot_hours("ann", 1, 0.0)
            .with_default_hours("ann", 10.0);
        let mut s = state(&items, &capacity);
        s.place(0, "ann", PlacementPass::Primary);
        assert_eq!(s.slot_of(0), Some(2));

        OverflowAbsorber::new("fill")
            .with_unassigned(true)
            .absorb(&mut s);
        assert_eq!(s.slot_of(1), Some(3));
    }

    #[test]
    fn test_does_not_move_committed_items() {
        let items = vec![WorkItem::new("F1").with_estimate(2.0).with_assignee("fill")];
        let capacity = CapacityTable::new(2).with_default_hours("fill", 10.0);
        let mut s = state(&items, &capacity);
        s.place(0, "fill", PlacementPass::Primary);
        assert_eq!(OverflowAbsorber::new("fill").absorb(&mut s), 0);
        assert!((s.ledger.remaining("fill", 1) - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_retries_unassigned_marked_no_assignee() {
        let items = vec![WorkItem::new("U1").with_estimate(2.0)];
        let capacity = CapacityTable::new(1).with_default_hours("fill", 5.0);
        let mut s = state(&items, &capacity);
        s.fail(0, UnassignableReason::NoAssignee);
        let absorbed = OverflowAbsorber::new("fill")
            .with_unassigned(true)
            .absorb(&mut s);
        assert_eq!(absorbed, 1);
        assert_eq!(s.slot_of(0), Some(1));
    }
}
