use anyhow::Result;
use colored::Colorize;
use declarative::{Action, ExecutionPlan, Resource};

use super::Workspace;
use crate::Context;
use crate::ui;

/// Re-read every managed project and report how it compares to the config
pub fn run(ctx: &Context, target: Option<&str>) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;
    let resources = workspace.refreshed_resources(target)?;
    let plan = ExecutionPlan::build(resources);

    ui::header("Refresh");
    let mut drifted = 0;
    for entry in &plan.entries {
        let address = entry.resource.address();
        match &entry.action {
            Action::NoChange => {
                if !ctx.quiet {
                    println!("  {} {address}", "✓".green());
                }
            }
            Action::Update { changes } | Action::Replace { changes } => {
                drifted += 1;
                println!("  {} {address} has drifted", "~".yellow().bold());
                for change in changes {
                    ui::dim(&format!("    {change}"));
                }
            }
            Action::Create => {
                println!("  {} {address} does not exist yet", "+".green().bold());
            }
            Action::Delete => {
                println!("  {} {address} is no longer declared", "-".red().bold());
            }
        }
    }

    println!();
    if drifted == 0 {
        ui::success(&format!(
            "State refreshed, {} project(s) recorded",
            workspace.state.projects.len()
        ));
    } else {
        ui::warn(&format!(
            "{drifted} project(s) drifted, run `regsync apply` to converge"
        ));
    }
    Ok(())
}
