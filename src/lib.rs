//! Sprint capacity planning.
//!
//! Places estimated, prioritized work items into fixed-length sprint slots
//! per assignee, honoring blocked-by precedence and per-slot capacity. The
//! result is a slot per item, a residual capacity ledger, and the list of
//! items that could not be placed with a reason for each.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `WorkItem`, `Priority`, `CapacityTable`,
//!   `AssignmentLedger`, `PlanningResult`
//! - **`precedence`**: Blocked-by graph, cycle detection, earliest slot
//! - **`validation`**: Input integrity checks (duplicate IDs, estimates,
//!   unknown predecessors, cycles, capacity)
//! - **`scheduler`**: `SprintPlanner` and `PlanKpi`
//! - **`config`**: TOML-loadable planner settings
//! - **`error`**: `PlanningError`
//!
//! # Example
//!
//! ```
//! use u_sprint::{PlannerConfig, SprintPlanner};
//! use u_sprint::models::WorkItem;
//!
//! let config = PlannerConfig::default().with_horizon(2).with_default_hours("ann", 10.0);
//! let items = vec![WorkItem::new("A").with_estimate(4.0).with_assignee("ann")];
//!
//! let result = SprintPlanner::from_config(&config)
//!     .plan(&items, &config.capacity_table())
//!     .unwrap();
//! assert_eq!(result.slot_of("A"), Some(1));
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Brucker (2007), "Scheduling Algorithms"

pub mod config;
pub mod error;
pub mod models;
pub mod precedence;
pub mod scheduler;
pub mod validation;

pub use config::PlannerConfig;
pub use error::{PlanResult, PlanningError};
pub use scheduler::{PlanKpi, SprintPlanner};
