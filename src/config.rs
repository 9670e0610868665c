//! Planner configuration.
//!
//! Settings the surrounding reporting service supplies per project: the
//! horizon, the fill pool, and default capacities. Loadable from TOML:
//!
//! ```toml
//! horizon = 6
//! fill_assignee = "platform-team"
//! absorb_unassigned = true
//! fallback_hours = 20.0
//!
//! [default_hours]
//! ann = 30.0
//! bob = 24.0
//!
//! [[slot_hours]]
//! assignee = "ann"
//! slot = 3
//! hours = 8.0
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::PlanResult;
use crate::models::{CapacityTable, DEFAULT_HORIZON};

/// One explicit (assignee, slot) capacity override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotHours {
    pub assignee: String,
    pub slot: usize,
    pub hours: f64,
}

/// Planner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Number of slots considered.
    pub horizon: usize,
    /// Pool whose backlog soaks up leftover capacity; scheduled last.
    pub fill_assignee: Option<String>,
    /// Whether items with no assignee may be absorbed by the fill pool.
    pub absorb_unassigned: bool,
    /// Hours per slot for assignees with no default.
    pub fallback_hours: f64,
    /// Per-assignee hours per slot.
    pub default_hours: BTreeMap<String, f64>,
    /// Per-slot overrides.
    pub slot_hours: Vec<SlotHours>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            fill_assignee: None,
            absorb_unassigned: false,
            fallback_hours: 0.0,
            default_hours: BTreeMap::new(),
            slot_hours: Vec::new(),
        }
    }
}

impl PlannerConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> PlanResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: &Path) -> PlanResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Sets the horizon.
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Sets the fill pool.
    pub fn with_fill_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.fill_assignee = Some(assignee.into());
        self
    }

    /// Lets the fill pool absorb items with no assignee.
    pub fn with_absorb_unassigned(mut self, absorb: bool) -> Self {
        self.absorb_unassigned = absorb;
        self
    }

    /// Sets the fallback hours.
    pub fn with_fallback_hours(mut self, hours: f64) -> Self {
        self.fallback_hours = hours;
        self
    }

    /// Sets an assignee's default hours.
    pub fn with_default_hours(mut self, assignee: impl Into<String>, hours: f64) -> Self {
        self.default_hours.insert(assignee.into(), hours);
        self
    }

    /// Adds a per-slot override.
    pub fn with_slot_hours(mut self, assignee: impl Into<String>, slot: usize, hours: f64) -> Self {
        self.slot_hours.push(SlotHours {
            assignee: assignee.into(),
            slot,
            hours,
        });
        self
    }

    /// Builds the capacity table described by this configuration.
    ///
    /// Later overrides for the same cell replace earlier ones.
    pub fn capacity_table(&self) -> CapacityTable {
        let table = self
            .default_hours
            .iter()
            .fold(
                CapacityTable::new(self.horizon).with_fallback_hours(self.fallback_hours),
                |t, (assignee, &hours)| t.with_default_hours(assignee.clone(), hours),
            );
        self.slot_hours.iter().fold(table, |t, o| {
            t.with_slot_hours(o.assignee.clone(), o.slot, o.hours)
        })
    }
}
