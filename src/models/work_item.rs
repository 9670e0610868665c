//! Work item model.
//!
//! A work item is the smallest schedulable unit: an issue with an hour
//! estimate, a priority, an owning capacity pool, and the ids of the items
//! that must land in an earlier slot.
//!
//! Items are built once per planning run from tracker data and are never
//! modified by the planner.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// Pool for items with no assignee. It never has capacity.
pub const UNASSIGNED_POOL: &str = "Unassigned";

/// Ordinal priority rank. Lower rank schedules earlier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    Highest = 0,
    High = 1,
    #[default]
    Medium = 2,
    Low = 3,
    Lowest = 4,
}

impl Priority {
    /// All priorities, highest first.
    pub const ALL: [Priority; 5] = [
        Priority::Highest,
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::Lowest,
    ];

    /// Numeric rank (0 = Highest).
    #[inline]
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Maps a rank back to a priority. Ranks past `Lowest` clamp to `Lowest`.
    pub fn from_rank(rank: u8) -> Self {
        Self::ALL
            .get(rank as usize)
            .copied()
            .unwrap_or(Priority::Lowest)
    }

    /// Tracker display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Highest => "Highest",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Lowest => "Lowest",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown priority: {s}"))
    }
}

/// A schedulable unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique, run-stable identifier (e.g. an issue key).
    pub id: String,
    /// Short description for rendering.
    #[serde(default)]
    pub summary: String,
    /// Estimated effort in hours. `None` = zero cost.
    #[serde(default)]
    pub estimate_hours: Option<f64>,
    /// Scheduling priority.
    #[serde(default)]
    pub priority: Priority,
    /// Owning capacity pool. `None` = [`UNASSIGNED_POOL`].
    #[serde(default)]
    pub assignee: Option<String>,
    /// Items that must be scheduled in a strictly earlier slot.
    #[serde(default)]
    pub blocked_by: BTreeSet<String>,
    /// Tracker-specific metadata, passed through untouched.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl WorkItem {
    /// Creates an unestimated, unassigned, medium-priority item.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: String::new(),
            estimate_hours: None,
            priority: Priority::default(),
            assignee: None,
            blocked_by: BTreeSet::new(),
            attributes: HashMap::new(),
        }
    }

    /// Sets the summary line.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Sets the estimate in hours.
    pub fn with_estimate(mut self, hours: f64) -> Self {
        self.estimate_hours = Some(hours);
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the owning pool.
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Adds a predecessor.
    pub fn with_blocker(mut self, predecessor_id: impl Into<String>) -> Self {
        self.blocked_by.insert(predecessor_id.into());
        self
    }

    /// Adds a tracker attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Hours charged against capacity when this item is committed.
    #[inline]
    pub fn cost_hours(&self) -> f64 {
        self.estimate_hours.unwrap_or(0.0)
    }

    /// Pool this item is charged against.
    pub fn pool(&self) -> &str {
        self.assignee.as_deref().unwrap_or(UNASSIGNED_POOL)
    }

    /// Whether the item belongs to the sentinel pool.
    pub fn is_unassigned(&self) -> bool {
        self.pool() == UNASSIGNED_POOL
    }

    /// Whether any predecessor is declared.
    pub fn has_blockers(&self) -> bool {
        !self.blocked_by.is_empty()
    }

    /// Scheduling order key: priority first, id as the tie-break.
    pub fn order_key(&self) -> (Priority, &str) {
        (self.priority, self.id.as_str())
    }
}
