use anyhow::{Result, bail};
use declarative::{ExecuteOptions, ExecutionPlan};

use super::{Workspace, plan};
use crate::Context;
use crate::cli::DestroyArgs;
use crate::progress::{self, ConsoleProgress, TerminalConfirm};
use crate::resource::ProjectResource;
use crate::ui;

pub fn run(ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;
    let resources: Vec<ProjectResource> = workspace
        .refreshed_resources(args.target.as_deref())?
        .into_iter()
        .filter(|resource| resource.state().is_present())
        .map(ProjectResource::into_retired)
        .collect();

    if resources.is_empty() {
        ui::info("No managed projects to destroy");
        return Ok(());
    }

    let mut plan = ExecutionPlan::build(resources);
    plan::display(&plan);

    let opts = ExecuteOptions {
        verbose: ctx.verbose > 0,
        ..Default::default()
    };
    let summary = declarative::execute(
        &mut plan,
        &opts,
        &mut ConsoleProgress::new(ctx.quiet),
        &mut TerminalConfirm::new(args.yes),
    )?;

    workspace.persist(plan.into_resources())?;
    progress::print_summary(&summary, false);

    if !summary.is_success() {
        bail!("{} project(s) could not be deleted", summary.failed);
    }
    Ok(())
}
