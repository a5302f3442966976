use anyhow::{Result, bail};
use declarative::{ExecuteOptions, ExecutionPlan};

use super::{Workspace, plan};
use crate::Context;
use crate::cli::ApplyArgs;
use crate::progress::{self, ConsoleProgress, TerminalConfirm};

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;
    let resources = workspace.refreshed_resources(args.target.as_deref())?;
    let mut plan = ExecutionPlan::build(resources);

    plan::display(&plan);
    if plan.is_empty() {
        return Ok(());
    }

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs.max(1),
        verbose: ctx.verbose > 0,
    };
    let summary = declarative::execute(
        &mut plan,
        &opts,
        &mut ConsoleProgress::new(ctx.quiet),
        &mut TerminalConfirm::new(args.yes),
    )?;

    if !opts.dry_run {
        workspace.persist(plan.into_resources())?;
    }
    progress::print_summary(&summary, opts.dry_run);

    if !summary.is_success() {
        bail!("{} project(s) failed to apply", summary.failed);
    }
    Ok(())
}
