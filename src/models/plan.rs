//! Planning result model.
//!
//! The immutable output of one planning run: where every item landed, the
//! final ledger, and the items that could not be placed together with the
//! reason. Placement failures are data here, never errors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::LedgerEntry;

/// Why an item could not be placed within the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnassignableReason {
    /// No slot from the earliest permitted one through the horizon had room.
    CapacityExhausted,
    /// Predecessors push the earliest permitted slot past the horizon.
    PrecedenceExceedsHorizon,
    /// A predecessor could not be placed.
    BlockedByUnassignable,
    /// The item has no assignee and was not absorbed by the fill pool.
    NoAssignee,
}

/// Which pass placed an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementPass {
    /// Its own pool's pass.
    Primary,
    /// Settled after every pool ran, because a predecessor lived in a later pool.
    Deferred,
    /// Absorbed into leftover fill-pool capacity.
    Absorbed,
}

/// Outcome for a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAssignment {
    /// Work item id.
    pub item_id: String,
    /// Pool charged (the fill pool for absorbed items).
    pub pool: String,
    /// Assigned slot, `None` if unassignable.
    pub slot: Option<usize>,
    /// Pass that placed the item, `None` if unassignable.
    pub pass: Option<PlacementPass>,
    /// Hours charged.
    pub hours: f64,
}

/// An item left out of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unassignable {
    /// Work item id.
    pub item_id: String,
    /// Failure reason.
    pub reason: UnassignableReason,
}

/// Result of a planning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningResult {
    /// Number of slots considered.
    pub horizon: usize,
    /// Outcome per item, keyed by id.
    pub assignments: BTreeMap<String, ItemAssignment>,
    /// Final ledger, sorted by (assignee, slot).
    pub ledger: Vec<LedgerEntry>,
    /// Items that could not be placed, sorted by id.
    pub unassignable: Vec<Unassignable>,
}

impl PlanningResult {
    /// Slot assigned to an item.
    pub fn slot_of(&self, item_id: &str) -> Option<usize> {
        self.assignments.get(item_id).and_then(|a| a.slot)
    }

    /// Whether an item was placed.
    pub fn is_assigned(&self, item_id: &str) -> bool {
        self.slot_of(item_id).is_some()
    }

    /// Failure reason for an item, if it was not placed.
    pub fn reason_for(&self, item_id: &str) -> Option<UnassignableReason> {
        self.unassignable
            .iter()
            .find(|u| u.item_id == item_id)
            .map(|u| u.reason)
    }

    /// Ids placed in a slot, sorted.
    pub fn items_in_slot(&self, slot: usize) -> Vec<&str> {
        self.assignments
            .values()
            .filter(|a| a.slot == Some(slot))
            .map(|a| a.item_id.as_str())
            .collect()
    }

    /// Placed assignments charged to a pool, ordered by slot then id.
    pub fn items_for_assignee(&self, assignee: &str) -> Vec<&ItemAssignment> {
        let mut items: Vec<&ItemAssignment> = self
            .assignments
            .values()
            .filter(|a| a.pool == assignee && a.slot.is_some())
            .collect();
        items.sort_by(|a, b| a.slot.cmp(&b.slot).then_with(|| a.item_id.cmp(&b.item_id)));
        items
    }

    /// Ledger cell for a pool and slot.
    pub fn cell(&self, assignee: &str, slot: usize) -> Option<&LedgerEntry> {
        self.ledger
            .iter()
            .find(|e| e.assignee == assignee && e.slot == slot)
    }

    /// Remaining hours for a pool in a slot (0.0 if unknown).
    pub fn remaining_hours(&self, assignee: &str, slot: usize) -> f64 {
        self.cell(assignee, slot)
            .map_or(0.0, LedgerEntry::remaining_hours)
    }

    /// Number of placed items.
    pub fn assigned_count(&self) -> usize {
        self.assignments.values().filter(|a| a.slot.is_some()).count()
    }

    /// Highest slot holding any item.
    pub fn last_used_slot(&self) -> Option<usize> {
        self.assignments.values().filter_map(|a| a.slot).max()
    }

    /// Whether every item was placed.
    pub fn is_complete(&self) -> bool {
        self.unassignable.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(id: &str, pool: &str, slot: Option<usize>, hours: f64) -> ItemAssignment {
        ItemAssignment {
            item_id: id.into(),
            pool: pool.into(),
            slot,
            pass: slot.map(|_| PlacementPass::Primary),
            hours,
        }
    }

    fn sample_result() -> PlanningResult {
        let mut assignments = BTreeMap::new();
        for a in [
            assignment("A", "ann", Some(1), 6.0),
            assignment("B", "ann", Some(2), 8.0),
            assignment("C", "bob", Some(1), 3.0),
            assignment("D", "bob", None, 25.0),
        ] {
            assignments.insert(a.item_id.clone(), a);
        }
        PlanningResult {
            horizon: 2,
            assignments,
            ledger: vec![
                LedgerEntry {
                    assignee: "ann".into(),
                    slot: 1,
                    committed_hours: 6.0,
                    available_hours: 10.0,
                },
                LedgerEntry {
                    assignee: "ann".into(),
                    slot: 2,
                    committed_hours: 8.0,
                    available_hours: 10.0,
                },
            ],
            unassignable: vec![Unassignable {
                item_id: "D".into(),
                reason: UnassignableReason::CapacityExhausted,
            }],
        }
    }

    #[test]
    fn test_lookups() {
        let r = sample_result();
        assert_eq!(r.slot_of("A"), Some(1));
        assert_eq!(r.slot_of("D"), None);
        assert_eq!(r.slot_of("missing"), None);
        assert!(r.is_assigned("B"));
        assert_eq!(
            r.reason_for("D"),
            Some(UnassignableReason::CapacityExhausted)
        );
        assert_eq!(r.reason_for("A"), None);
    }

    #[test]
    fn test_slot_and_assignee_views() {
        let r = sample_result();
        assert_eq!(r.items_in_slot(1), vec!["A", "C"]);
        let ann: Vec<_> = r
            .items_for_assignee("ann")
            .iter()
            .map(|a| a.item_id.as_str())
            .collect();
        assert_eq!(ann, vec!["A", "B"]);
        assert!(r.items_for_assignee("bob").len() == 1);
    }

    #[test]
    fn test_ledger_views() {
        let r = sample_result();
        assert!((r.remaining_hours("ann", 1) - 4.0).abs() < 1e-10);
        assert!((r.remaining_hours("ann", 2) - 2.0).abs() < 1e-10);
        assert_eq!(r.remaining_hours("carol", 1), 0.0);
    }

    #[test]
    fn test_summary_counts() {
        let r = sample_result();
        assert_eq!(r.assigned_count(), 3);
        assert_eq!(r.last_used_slot(), Some(2));
        assert!(!r.is_complete());
    }

    #[test]
    fn test_json_shape() {
        let r = sample_result();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["assignments"]["A"]["slot"], 1);
        assert_eq!(json["unassignable"][0]["reason"], "CapacityExhausted");
        let back: PlanningResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.slot_of("B"), Some(2));
    }
}
