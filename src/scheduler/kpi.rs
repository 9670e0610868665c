//! Plan quality metrics (KPIs).
//!
//! Computes capacity and coverage indicators from a completed plan.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Assigned | Items committed to a slot |
//! | Unassignable | Items left out of the plan |
//! | Committed hours | Sum of committed hours across the ledger |
//! | Available hours | Sum of capacity across the ledger |
//! | Utilization | committed / available, per assignee |
//! | Avg Utilization | Mean over assignees with capacity |
//! | Slot load | Committed hours per slot, all assignees |
//! | Last used slot | Highest slot holding an item |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::BTreeMap;

use crate::models::PlanningResult;

/// Plan performance indicators.
///
/// All hour values are in estimated work hours.
#[derive(Debug, Clone)]
pub struct PlanKpi {
    /// Items committed to a slot.
    pub assigned: usize,
    /// Items left out of the plan.
    pub unassignable: usize,
    /// Fraction of items assigned (0.0..1.0).
    pub assigned_rate: f64,
    /// Total committed hours.
    pub committed_hours: f64,
    /// Total available hours.
    pub available_hours: f64,
    /// Average utilization over assignees with any capacity (0.0..1.0).
    pub avg_utilization: f64,
    /// Per-assignee utilization; assignees without capacity are omitted.
    pub utilization_by_assignee: BTreeMap<String, f64>,
    /// Committed hours per slot; index 0 is slot 1.
    pub load_by_slot: Vec<f64>,
    /// Highest slot holding an item.
    pub last_used_slot: Option<usize>,
}

impl PlanKpi {
    /// Computes KPIs from a plan.
    pub fn calculate(result: &PlanningResult) -> Self {
        let mut load_by_slot = vec![0.0; result.horizon];
        let mut per_assignee: BTreeMap<&str, (f64, f64)> = BTreeMap::new();

        for cell in &result.ledger {
            if let Some(load) = cell.slot.checked_sub(1).and_then(|i| load_by_slot.get_mut(i)) {
                *load += cell.committed_hours;
            }
            let totals = per_assignee.entry(cell.assignee.as_str()).or_default();
            totals.0 += cell.committed_hours;
            totals.1 += cell.available_hours;
        }

        let committed_hours: f64 = per_assignee.values().map(|t| t.0).sum();
        let available_hours: f64 = per_assignee.values().map(|t| t.1).sum();

        let utilization_by_assignee: BTreeMap<String, f64> = per_assignee
            .into_iter()
            .filter(|(_, (_, available))| *available > 0.0)
            .map(|(name, (committed, available))| (name.to_string(), committed / available))
            .collect();

        let avg_utilization = if utilization_by_assignee.is_empty() {
            0.0
        } else {
            let sum: f64 = utilization_by_assignee.values().sum();
            sum / utilization_by_assignee.len() as f64
        };

        let assigned = result.assigned_count();
        let unassignable = result.unassignable.len();
        let total = assigned + unassignable;
        let assigned_rate = if total == 0 {
            1.0
        } else {
            assigned as f64 / total as f64
        };

        Self {
            assigned,
            unassignable,
            assigned_rate,
            committed_hours,
            available_hours,
            avg_utilization,
            utilization_by_assignee,
            load_by_slot,
            last_used_slot: result.last_used_slot(),
        }
    }

    /// Whether the plan meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_unassignable: usize, min_utilization: f64) -> bool {
        self.unassignable <= max_unassignable && self.avg_utilization >= min_utilization
    }
}
