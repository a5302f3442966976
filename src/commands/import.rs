use anyhow::{Context as _, Result, bail};
use harbor::wire::identity_from_location;
use harbor::{ProjectState, ReadOutcome};

use super::Workspace;
use crate::Context;
use crate::ui;

/// Adopt an existing project into state by its identity
pub fn run(ctx: &Context, name: &str, id: &str) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;

    if let Some(recorded) = workspace.state.get(name)
        && let Some(existing) = &recorded.id
    {
        bail!("project {name} is already managed as {existing}");
    }

    let identity = parse_identity(id)?;
    let mut project = ProjectState::with_id(name, identity.clone());
    let outcome = workspace
        .client
        .reconciler()
        .read(&mut project)
        .with_context(|| format!("Failed to read {identity}"))?;

    if outcome == ReadOutcome::Absent {
        bail!("no project exists at {identity}");
    }
    if project.name != name {
        bail!("{identity} is project {}, not {name}", project.name);
    }

    workspace.state.record(project);
    workspace.state.save()?;

    ui::success(&format!("Imported project.{name} ({identity})"));
    if workspace.config.project(name).is_none() {
        ui::warn(&format!(
            "{name} is not declared in {}, the next apply will delete it",
            ctx.config_path.display()
        ));
    }
    Ok(())
}

/// Accept `12`, `/projects/12` or a full project URL
fn parse_identity(id: &str) -> Result<String> {
    let id = id.trim();
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        return Ok(format!("/projects/{id}"));
    }
    match identity_from_location(id) {
        Some(identity) if identity.starts_with("/projects/") => Ok(identity),
        _ => bail!("{id:?} is not a project id, expected e.g. 12 or /projects/12"),
    }
}
