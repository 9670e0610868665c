//! Assignment ledger.
//!
//! Running record of committed hours per (pool, slot). Committed hours only
//! grow, and a commit is accepted only if the cell keeps
//! `committed <= available`. The comparison is exact: an item over the
//! remaining hours by any amount does not fit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::CapacityTable;
use crate::error::{PlanResult, PlanningError};

/// One (pool, slot) cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerCell {
    /// Hours available in this slot.
    pub available: f64,
    /// Hours committed so far.
    pub committed: f64,
}

impl LedgerCell {
    fn new(available: f64) -> Self {
        Self {
            available,
            committed: 0.0,
        }
    }

    /// Unconsumed hours (never negative).
    #[inline]
    pub fn remaining(&self) -> f64 {
        (self.available - self.committed).max(0.0)
    }

    /// Whether `hours` more can be committed without exceeding capacity.
    #[inline]
    pub fn fits(&self, hours: f64) -> bool {
        self.committed + hours <= self.available
    }

    #[inline]
    fn is_consistent(&self) -> bool {
        self.committed <= self.available
    }
}

/// Flattened ledger cell for the planning result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Capacity pool.
    pub assignee: String,
    /// Slot index (1-based).
    pub slot: usize,
    /// Hours committed.
    pub committed_hours: f64,
    /// Hours available.
    pub available_hours: f64,
}

impl LedgerEntry {
    /// Unconsumed hours.
    pub fn remaining_hours(&self) -> f64 {
        (self.available_hours - self.committed_hours).max(0.0)
    }

    /// Committed / available, or 0.0 for a zero-capacity cell.
    pub fn utilization(&self) -> f64 {
        if self.available_hours <= 0.0 {
            0.0
        } else {
            self.committed_hours / self.available_hours
        }
    }
}

/// Committed hours per (pool, slot) for one planning run.
#[derive(Debug, Clone)]
pub struct AssignmentLedger {
    horizon: usize,
    rows: BTreeMap<String, Vec<LedgerCell>>,
}

impl AssignmentLedger {
    /// Opens a row for every pool, with availability taken from `capacity`.
    pub fn open<'a>(capacity: &CapacityTable, pools: impl IntoIterator<Item = &'a str>) -> Self {
        let horizon = capacity.horizon();
        let rows = pools
            .into_iter()
            .map(|pool| {
                let row = capacity
                    .slots()
                    .map(|slot| LedgerCell::new(capacity.hours_available(pool, slot)))
                    .collect();
                (pool.to_string(), row)
            })
            .collect();
        Self { horizon, rows }
    }

    /// Number of slots tracked per pool.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Looks up a cell. `None` for unknown pools or slots outside `1..=horizon`.
    pub fn cell(&self, pool: &str, slot: usize) -> Option<&LedgerCell> {
        let idx = slot.checked_sub(1)?;
        self.rows.get(pool)?.get(idx)
    }

    /// Whether `hours` fit in the cell.
    pub fn fits(&self, pool: &str, slot: usize, hours: f64) -> bool {
        self.cell(pool, slot).is_some_and(|c| c.fits(hours))
    }

    /// Remaining hours in the cell (0.0 when the cell does not exist).
    pub fn remaining(&self, pool: &str, slot: usize) -> f64 {
        self.cell(pool, slot).map_or(0.0, LedgerCell::remaining)
    }

    /// Commits `hours` if they fit. Returns whether the commit happened.
    pub fn try_commit(&mut self, pool: &str, slot: usize, hours: f64) -> bool {
        let Some(cell) = slot
            .checked_sub(1)
            .and_then(|idx| self.rows.get_mut(pool)?.get_mut(idx))
        else {
            return false;
        };
        if !cell.fits(hours) {
            return false;
        }
        cell.committed += hours;
        debug_assert!(
            cell.is_consistent(),
            "ledger cell ({pool}, {slot}) over capacity: {} > {}",
            cell.committed,
            cell.available
        );
        true
    }

    /// First slot in `from..=horizon` where `hours` fit.
    pub fn first_fit(&self, pool: &str, from: usize, hours: f64) -> Option<usize> {
        (from.max(1)..=self.horizon).find(|&slot| self.fits(pool, slot, hours))
    }

    /// Re-checks every cell against its capacity.
    pub fn verify(&self) -> PlanResult<()> {
        for (pool, row) in &self.rows {
            for (idx, cell) in row.iter().enumerate() {
                if !cell.is_consistent() {
                    return Err(PlanningError::CapacityInvariant {
                        assignee: pool.clone(),
                        slot: idx + 1,
                        committed: cell.committed,
                        available: cell.available,
                    });
                }
            }
        }
        Ok(())
    }

    /// All cells, sorted by (pool, slot).
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.rows
            .iter()
            .flat_map(|(pool, row)| {
                row.iter().enumerate().map(move |(idx, cell)| LedgerEntry {
                    assignee: pool.clone(),
                    slot: idx + 1,
                    committed_hours: cell.committed,
                    available_hours: cell.available,
                })
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn force_commit(&mut self, pool: &str, slot: usize, hours: f64) {
        if let Some(cell) = self.rows.get_mut(pool).and_then(|r| r.get_mut(slot - 1)) {
            cell.committed += hours;
        }
    }
}
