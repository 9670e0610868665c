//! Capacity table.
//!
//! Available hours per (assignee, slot) over a fixed horizon. Lookup order:
//!
//! 1. Explicit per-slot entry.
//! 2. Per-assignee default, replicated across every slot.
//! 3. Table-wide fallback.
//!
//! Slots are 1-indexed. Slots outside `1..=horizon` and the
//! [`UNASSIGNED_POOL`] always have zero capacity.

use std::collections::BTreeMap;

use super::UNASSIGNED_POOL;
use crate::error::{PlanResult, PlanningError};

/// Default number of slots considered.
pub const DEFAULT_HORIZON: usize = 10;

/// Per-(assignee, slot) available hours.
#[derive(Debug, Clone)]
pub struct CapacityTable {
    horizon: usize,
    fallback_hours: f64,
    default_hours: BTreeMap<String, f64>,
    slot_hours: BTreeMap<(String, usize), f64>,
}

impl CapacityTable {
    /// Creates an empty table over `horizon` slots.
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            fallback_hours: 0.0,
            default_hours: BTreeMap::new(),
            slot_hours: BTreeMap::new(),
        }
    }

    /// Hours for assignees with no default and no slot entry.
    pub fn with_fallback_hours(mut self, hours: f64) -> Self {
        self.fallback_hours = hours;
        self
    }

    /// Sets the per-slot default for one assignee.
    pub fn with_default_hours(mut self, assignee: impl Into<String>, hours: f64) -> Self {
        self.default_hours.insert(assignee.into(), hours);
        self
    }

    /// Overrides a single (assignee, slot) cell.
    pub fn with_slot_hours(mut self, assignee: impl Into<String>, slot: usize, hours: f64) -> Self {
        self.slot_hours.insert((assignee.into(), slot), hours);
        self
    }

    /// Number of slots in the horizon.
    #[inline]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Slot indices `1..=horizon`.
    pub fn slots(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.horizon
    }

    /// Available hours for an assignee in a slot.
    pub fn hours_available(&self, assignee: &str, slot: usize) -> f64 {
        if assignee == UNASSIGNED_POOL || slot == 0 || slot > self.horizon {
            return 0.0;
        }
        if let Some(&hours) = self.slot_hours.get(&(assignee.to_string(), slot)) {
            return hours;
        }
        self.default_hours
            .get(assignee)
            .copied()
            .unwrap_or(self.fallback_hours)
    }

    /// Sum of available hours across the horizon.
    pub fn total_hours(&self, assignee: &str) -> f64 {
        self.slots()
            .map(|slot| self.hours_available(assignee, slot))
            .sum()
    }

    /// Assignees named anywhere in the table, sorted.
    pub fn configured_assignees(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .default_hours
            .keys()
            .map(String::as_str)
            .chain(self.slot_hours.keys().map(|(a, _)| a.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Checks the horizon and that every configured value is finite and non-negative.
    ///
    /// Slot entries outside the horizon are ignored by lookups and not reported.
    pub fn validate(&self) -> PlanResult<()> {
        if self.horizon == 0 {
            return Err(PlanningError::EmptyHorizon);
        }
        let invalid = |h: f64| !h.is_finite() || h < 0.0;
        if invalid(self.fallback_hours) {
            return Err(PlanningError::InvalidCapacity {
                assignee: "*".into(),
                slot: 0,
                hours: self.fallback_hours,
            });
        }
        for (assignee, &hours) in &self.default_hours {
            if invalid(hours) {
                return Err(PlanningError::InvalidCapacity {
                    assignee: assignee.clone(),
                    slot: 0,
                    hours,
                });
            }
        }
        for ((assignee, slot), &hours) in &self.slot_hours {
            if invalid(hours) {
                return Err(PlanningError::InvalidCapacity {
                    assignee: assignee.clone(),
                    slot: *slot,
                    hours,
                });
            }
        }
        Ok(())
    }
}

impl Default for CapacityTable {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> CapacityTable {
        CapacityTable::new(4)
            .with_fallback_hours(20.0)
            .with_default_hours("ann", 30.0)
            .with_slot_hours("ann", 2, 12.0)
            .with_slot_hours("bob", 1, 5.0)
    }

    #[test]
    fn test_lookup_precedence() {
        let t = sample_table();
        assert!((t.hours_available("ann", 1) - 30.0).abs() < 1e-10);
        assert!((t.hours_available("ann", 2) - 12.0).abs() < 1e-10);
        assert!((t.hours_available("bob", 1) - 5.0).abs() < 1e-10);
        assert!((t.hours_available("bob", 2) - 20.0).abs() < 1e-10);
        assert!((t.hours_available("carol", 3) - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_outside_horizon_is_zero() {
        let t = sample_table();
        assert_eq!(t.hours_available("ann", 0), 0.0);
        assert_eq!(t.hours_available("ann", 5), 0.0);
    }

    #[test]
    fn test_unassigned_pool_has_no_capacity() {
        let t = sample_table().with_default_hours(UNASSIGNED_POOL, 40.0);
        assert_eq!(t.hours_available(UNASSIGNED_POOL, 1), 0.0);
        assert_eq!(t.total_hours(UNASSIGNED_POOL), 0.0);
    }

    #[test]
    fn test_total_hours() {
        let t = sample_table();
        // 30 + 12 + 30 + 30
        assert!((t.total_hours("ann") - 102.0).abs() < 1e-10);
    }

    #[test]
    fn test_configured_assignees() {
        assert_eq!(sample_table().configured_assignees(), vec!["ann", "bob"]);
    }

    #[test]
    fn test_validate() {
        assert!(sample_table().validate().is_ok());

        let err = CapacityTable::new(0).validate().unwrap_err();
        assert!(matches!(err, PlanningError::EmptyHorizon));

        let err = sample_table()
            .with_slot_hours("bob", 3, -1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            PlanningError::InvalidCapacity { ref assignee, slot: 3, .. } if assignee == "bob"
        ));

        let err = sample_table()
            .with_default_hours("carol", f64::NAN)
            .validate()
            .unwrap_err();
        assert!(matches!(err, PlanningError::InvalidCapacity { .. }));
    }

    #[test]
    fn test_default_horizon() {
        assert_eq!(CapacityTable::default().horizon(), DEFAULT_HORIZON);
    }
}
