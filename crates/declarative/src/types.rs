//! Core types for declarative resource management

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Comparable fields of a resource, rendered as strings
///
/// Ordered so that plans and diffs print deterministically.
pub type Attributes = BTreeMap<String, String>;

/// One field that differs between desired and current attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    /// Current value, `None` when the field is not known yet
    pub from: Option<String>,
    pub to: String,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.from {
            Some(from) => write!(f, "{}: {from:?} -> {:?}", self.field, self.to),
            None => write!(f, "{}: (unknown) -> {:?}", self.field, self.to),
        }
    }
}

/// What must happen to a resource to reach its desired state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Already converged
    NoChange,
    /// Does not exist yet
    Create,
    /// Exists; fields change in place
    Update { changes: Vec<FieldChange> },
    /// Exists; an immutable field changes, so delete then create
    Replace { changes: Vec<FieldChange> },
    /// Exists but is no longer declared
    Delete,
}

impl Action {
    /// Check if the action changes anything
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoChange)
    }

    /// Field changes carried by the action, if any
    pub fn changes(&self) -> &[FieldChange] {
        match self {
            Self::Update { changes } | Self::Replace { changes } => changes,
            _ => &[],
        }
    }

    /// Plan symbol, as printed next to the resource address
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::NoChange => " ",
            Self::Create => "+",
            Self::Update { .. } => "~",
            Self::Replace { .. } => "-/+",
            Self::Delete => "-",
        }
    }

    /// Verb describing the action
    pub fn verb(&self) -> &'static str {
        match self {
            Self::NoChange => "unchanged",
            Self::Create => "create",
            Self::Update { .. } => "update",
            Self::Replace { .. } => "replace",
            Self::Delete => "delete",
        }
    }
}

/// Current state of a resource, as reported by a refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState {
    /// Resource exists with these attributes
    Present { attributes: Attributes },
    /// Resource does not exist
    Absent,
}

impl ResourceState {
    /// Check if state represents presence
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// Check if state represents absence
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Attributes of a present resource
    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            Self::Present { attributes } => Some(attributes),
            Self::Absent => None,
        }
    }
}

/// Result of applying a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Resource was created
    Created,
    /// Resource was modified in place
    Modified,
    /// Resource was deleted and created again
    Replaced,
    /// Resource was removed
    Removed,
    /// Apply failed
    Failed { error: String },
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Self::Created | Self::Modified | Self::Replaced | Self::Removed
        )
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub replaced: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.replaced + self.removed
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.total_changes() + self.skipped + self.failed + self.no_change
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Replaced => self.replaced += 1,
            ApplyResult::Removed => self.removed += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of resources applied in parallel
    pub jobs: usize,
    /// Verbose output
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            verbose: false,
        }
    }
}
