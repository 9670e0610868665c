//! Planning domain models.
//!
//! Plain data types for the planner's input (work items, capacity) and
//! output (ledger, planning result).
//!
//! # Domain Mappings
//!
//! | u-sprint | Issue tracker | Spreadsheet |
//! |----------|---------------|-------------|
//! | WorkItem | Issue | — |
//! | Pool | Assignee | Capacity row |
//! | Slot | Sprint | Sprint column |
//! | CapacityTable | — | Hours sheet |

mod capacity;
mod ledger;
mod plan;
mod work_item;

pub use capacity::{CapacityTable, DEFAULT_HORIZON};
pub use ledger::{AssignmentLedger, LedgerCell, LedgerEntry};
pub use plan::{ItemAssignment, PlacementPass, PlanningResult, Unassignable, UnassignableReason};
pub use work_item::{Priority, WorkItem, UNASSIGNED_POOL};
