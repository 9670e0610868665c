//! Planner error types.
//!
//! Only configuration and internal-consistency problems are errors.
//! Items that cannot be placed are reported as data in
//! [`PlanningResult::unassignable`](crate::models::PlanningResult).

use thiserror::Error;

/// Errors that abort a planning run.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("cyclic precedence among work items: {}", .members.join(" -> "))]
    CyclicDependency { members: Vec<String> },

    #[error("work item '{item}' is blocked by unknown item '{predecessor}'")]
    UnknownPredecessor { item: String, predecessor: String },

    #[error("duplicate work item id: {0}")]
    DuplicateItem(String),

    #[error("work item '{item}' has invalid estimate {hours}h")]
    InvalidEstimate { item: String, hours: f64 },

    #[error("invalid capacity {hours}h for '{assignee}' in slot {slot}")]
    InvalidCapacity {
        assignee: String,
        slot: usize,
        hours: f64,
    },

    #[error("planning horizon must contain at least one slot")]
    EmptyHorizon,

    #[error(
        "capacity invariant violated for '{assignee}' in slot {slot}: committed {committed}h of {available}h"
    )]
    CapacityInvariant {
        assignee: String,
        slot: usize,
        committed: f64,
        available: f64,
    },

    #[error("invalid planner configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read planner configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl PlanningError {
    /// Whether this error indicates a scheduler defect rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::CapacityInvariant { .. })
    }
}

pub type PlanResult<T> = Result<T, PlanningError>;
