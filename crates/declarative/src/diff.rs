//! Diff computation for resources

use crate::types::{Action, Attributes, FieldChange};
use serde::{Deserialize, Serialize};

/// Decide the action that takes `current` to `desired`
///
/// `None` on either side means the resource is absent there. Only keys present
/// in `desired` are compared: anything else in `current` is computed by the
/// remote side. A change to any field named in `force_new` turns the update
/// into a replacement.
///
/// # Example
///
/// ```
/// use declarative::{Action, Attributes, diff_attributes};
///
/// let desired = Attributes::from([("public".to_string(), "true".to_string())]);
/// let current = Attributes::from([
///     ("public".to_string(), "false".to_string()),
///     ("project_id".to_string(), "12".to_string()),
/// ]);
///
/// let action = diff_attributes(Some(&desired), Some(&current), &["name"]);
/// assert!(matches!(action, Action::Update { ref changes } if changes.len() == 1));
/// ```
pub fn diff_attributes(
    desired: Option<&Attributes>,
    current: Option<&Attributes>,
    force_new: &[&str],
) -> Action {
    let (desired, current) = match (desired, current) {
        (None, None) => return Action::NoChange,
        (Some(_), None) => return Action::Create,
        (None, Some(_)) => return Action::Delete,
        (Some(desired), Some(current)) => (desired, current),
    };

    let changes: Vec<FieldChange> = desired
        .iter()
        .filter(|(field, value)| current.get(*field) != Some(*value))
        .map(|(field, value)| FieldChange {
            field: field.clone(),
            from: current.get(field).cloned(),
            to: value.clone(),
        })
        .collect();

    if changes.is_empty() {
        Action::NoChange
    } else if changes
        .iter()
        .any(|change| force_new.contains(&change.field.as_str()))
    {
        Action::Replace { changes }
    } else {
        Action::Update { changes }
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub to_create: usize,
    pub to_update: usize,
    pub to_replace: usize,
    pub to_delete: usize,
    pub unchanged: usize,
}

impl DiffSummary {
    /// Create a summary from a list of actions
    pub fn from_actions<'a>(actions: impl IntoIterator<Item = &'a Action>) -> Self {
        let mut summary = Self::default();
        for action in actions {
            match action {
                Action::NoChange => summary.unchanged += 1,
                Action::Create => summary.to_create += 1,
                Action::Update { .. } => summary.to_update += 1,
                Action::Replace { .. } => summary.to_replace += 1,
                Action::Delete => summary.to_delete += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.to_create + self.to_update + self.to_replace + self.to_delete
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}
