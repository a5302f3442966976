//! # Declarative
//!
//! A small plan/apply engine for declaratively managed remote objects.
//!
//! ## Core Concepts
//!
//! - **Resource**: A remote object paired with its declared and recorded attributes
//! - **Action**: What converges it: create, update, replace, delete or nothing
//! - **ExecutionPlan**: Every resource with its planned action, filterable by target
//! - **Executor**: Applies the plan, sequentially or on a rayon pool
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecutionPlan, ExecuteOptions, execute_simple};
//!
//! let mut plan = ExecutionPlan::build(resources).filter_by_target(Some("project.team-a"));
//! for entry in plan.changes() {
//!     println!("{} {}", entry.action.symbol(), entry.resource.address());
//! }
//!
//! let summary = execute_simple(&mut plan, &ExecuteOptions::default())?;
//! println!("{} changed", summary.total_changes());
//! ```
//!
//! ## Callback Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on
//! specific UI frameworks.

pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use diff::{DiffSummary, diff_attributes};
pub use executor::{execute, execute_simple};
pub use planner::{ExecutionPlan, PlannedResource};
pub use resource::Resource;
pub use types::{
    Action, ApplyResult, Attributes, ExecuteOptions, ExecuteSummary, FieldChange, ResourceState,
};
