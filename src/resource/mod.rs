//! Resources managed by regsync
//!
//! Every declared or recorded registry object is modeled as a
//! [`declarative::Resource`], so planning and applying go through the
//! generic engine.

mod project;

pub use project::ProjectResource;

use harbor::Client;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::RegsyncConfig;
use crate::state::RegsyncState;

/// Pair declared projects with their state, then add recorded projects that
/// are no longer declared
pub fn project_resources(
    client: &Arc<Client>,
    config: &RegsyncConfig,
    state: &RegsyncState,
) -> Vec<ProjectResource> {
    let declared: BTreeSet<&str> = config.projects.iter().map(|p| p.name.as_str()).collect();

    let mut resources: Vec<ProjectResource> = config
        .projects
        .iter()
        .map(|project| {
            ProjectResource::declared(
                Arc::clone(client),
                project.clone(),
                state.get(&project.name).cloned(),
            )
        })
        .collect();

    resources.extend(
        state
            .projects
            .values()
            .filter(|recorded| !declared.contains(recorded.name.as_str()))
            .map(|recorded| ProjectResource::orphaned(Arc::clone(client), recorded.clone())),
    );

    resources
}
