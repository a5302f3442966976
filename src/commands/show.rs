use anyhow::{Result, bail};
use colored::Colorize;
use harbor::ProjectState;

use crate::Context;
use crate::paths;
use crate::state::RegsyncState;
use crate::ui;

/// Print recorded state, for one project or all of them
pub fn run(_ctx: &Context, name: Option<&str>) -> Result<()> {
    let state = RegsyncState::load()?;

    if let Some(name) = name {
        let Some(project) = state.get(name) else {
            bail!("project {name} is not in state");
        };
        show_project(project);
        return Ok(());
    }

    ui::header("Managed projects");
    if state.projects.is_empty() {
        ui::dim("none recorded");
    }
    for project in state.projects.values() {
        println!(
            "  {} {} {}",
            project.name.bold(),
            project.id.as_deref().unwrap_or("-").dimmed(),
            ui::format_quota(project.storage_quota).dimmed()
        );
    }

    println!();
    ui::kv("State file", &paths::state_file()?.display().to_string());
    ui::kv(
        "Last updated",
        &state.last_updated.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    Ok(())
}

fn show_project(project: &ProjectState) {
    ui::header(&format!("project.{}", project.name));
    ui::kv("id", project.id.as_deref().unwrap_or("-"));
    ui::kv("project_id", &project.project_id.to_string());
    ui::kv("registry_id", &project.registry_id.to_string());
    ui::kv("public", &project.public.to_string());
    ui::kv(
        "vulnerability_scanning",
        &project.vulnerability_scanning.to_string(),
    );
    ui::kv(
        "enable_content_trust",
        &project.enable_content_trust.to_string(),
    );
    ui::kv(
        "enable_content_trust_cosign",
        &project.enable_content_trust_cosign.to_string(),
    );
    ui::kv(
        "auto_sbom_generation",
        &project.auto_sbom_generation.to_string(),
    );
    let security = if project.deployment_security.is_empty() {
        "(unset)"
    } else {
        project.deployment_security.as_str()
    };
    ui::kv("deployment_security", security);
    ui::kv("cve_allowlist", &project.cve_allowlist.join(", "));
    ui::kv("storage_quota", &ui::format_quota(project.storage_quota));
    ui::kv("force_destroy", &project.force_destroy.to_string());
}
