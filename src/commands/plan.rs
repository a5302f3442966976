use anyhow::Result;
use colored::Colorize;
use declarative::{Action, ExecutionPlan, Resource};
use serde::Serialize;

use super::Workspace;
use crate::Context;
use crate::cli::PlanArgs;
use crate::ui;

/// One entry of `plan --json`
#[derive(Serialize)]
struct PlanEntry<'a> {
    address: String,
    #[serde(flatten)]
    action: &'a Action,
}

pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;
    let resources = workspace.refreshed_resources(args.target.as_deref())?;
    let plan = ExecutionPlan::build(resources);

    if args.json {
        println!("{}", to_json(&plan)?);
        return Ok(());
    }

    display(&plan);
    Ok(())
}

fn to_json<R: Resource>(plan: &ExecutionPlan<R>) -> Result<String> {
    let entries: Vec<PlanEntry<'_>> = plan
        .changes()
        .map(|entry| PlanEntry {
            address: entry.resource.address(),
            action: &entry.action,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Print every change of a plan and a one-line summary
pub fn display<R: Resource>(plan: &ExecutionPlan<R>) {
    if plan.is_empty() {
        println!();
        ui::success("No changes. The registry matches the configuration.");
        return;
    }

    ui::header("Plan");
    for entry in plan.changes() {
        let suffix = match entry.action {
            Action::Replace { .. } => " (forces replacement)".red().to_string(),
            _ => String::new(),
        };
        println!(
            "  {} {}{suffix}",
            ui::action_symbol(&entry.action),
            entry.resource.address().bold()
        );
        for change in entry.action.changes() {
            ui::dim(&format!("    {change}"));
        }
    }

    let summary = plan.summary();
    println!();
    println!(
        "  Plan: {} to create, {} to update, {} to replace, {} to delete.",
        summary.to_create.to_string().green(),
        summary.to_update.to_string().yellow(),
        summary.to_replace.to_string().magenta(),
        summary.to_delete.to_string().red()
    );
}
