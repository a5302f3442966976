//! Execution planner - pairs each resource with the action it needs

use crate::diff::DiffSummary;
use crate::resource::Resource;
use crate::types::Action;

/// A resource and its planned action
#[derive(Debug)]
pub struct PlannedResource<R> {
    pub resource: R,
    pub action: Action,
}

/// An execution plan: every resource with its planned action, in order
#[derive(Debug)]
pub struct ExecutionPlan<R> {
    pub entries: Vec<PlannedResource<R>>,
}

impl<R: Resource> ExecutionPlan<R> {
    /// Plan every resource
    pub fn build(resources: Vec<R>) -> Self {
        let entries = resources
            .into_iter()
            .map(|resource| {
                let action = resource.plan();
                PlannedResource { resource, action }
            })
            .collect();
        Self { entries }
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&R) -> bool,
    {
        Self {
            entries: self
                .entries
                .into_iter()
                .filter(|entry| predicate(&entry.resource))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type" or "type.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type.as_deref(), name.as_deref()))
            }
        }
    }

    /// Entries whose action changes something
    pub fn changes(&self) -> impl Iterator<Item = &PlannedResource<R>> {
        self.entries.iter().filter(|entry| entry.action.is_change())
    }

    /// Counts per action kind
    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_actions(self.entries.iter().map(|entry| &entry.action))
    }

    /// Total number of resources in the plan
    pub fn total_resources(&self) -> usize {
        self.entries.len()
    }

    /// Check if the plan changes nothing
    pub fn is_empty(&self) -> bool {
        self.changes().next().is_none()
    }

    /// Consume the plan, returning the resources
    pub fn into_resources(self) -> Vec<R> {
        self.entries.into_iter().map(|entry| entry.resource).collect()
    }
}

/// Parse a target string like "type.name" into (type, name)
///
/// Only the first dot separates type and name, since names may contain dots.
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some((resource_type, name)) if !resource_type.is_empty() && !name.is_empty() => {
            (Some(resource_type.to_string()), Some(name.to_string()))
        }
        Some(_) => (None, Some(target.to_string())),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter<R: Resource>(
    resource: &R,
    resource_type: Option<&str>,
    name: Option<&str>,
) -> bool {
    if let Some(rt) = resource_type {
        // Allow the plural alias
        let matches_type = match rt {
            "projects" => resource.resource_type() == "project",
            _ => resource.resource_type() == rt,
        };
        if !matches_type {
            return false;
        }
    }

    if let Some(n) = name
        && resource.id() != n
    {
        return false;
    }

    true
}
