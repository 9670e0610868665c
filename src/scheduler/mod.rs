//! Sprint planner and KPI evaluation.
//!
//! Provides the capacity planner that commits work items to (assignee, slot)
//! cells, and plan quality metrics.
//!
//! # Algorithm
//!
//! `SprintPlanner` runs one greedy, priority-driven, first-fit pass per
//! assignee pool, honoring precedence by starting each dependent's slot
//! scan after its latest predecessor. A capacity-first absorber then fills
//! gaps in the fill pool. Not optimal, but deterministic and fast.
//!
//! # KPI
//!
//! `PlanKpi` computes assigned counts, committed hours, utilization, and
//! per-slot load.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Kahn (1962), "Topological sorting of large networks"

mod absorber;
mod kpi;
mod planner;
mod state;

pub use kpi::PlanKpi;
pub use planner::{PlanRequest, SprintPlanner};
