//! Execution engine - applies planned actions, optionally in parallel

use crate::context::{ApplyContext, AutoConfirm, ConfirmCallback, NoProgress, ProgressCallback};
use crate::planner::{ExecutionPlan, PlannedResource};
use crate::resource::Resource;
use crate::types::{Action, ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::Result;
use rayon::prelude::*;

/// Execute a plan with the given options and callbacks
///
/// Resources keep their post-apply state inside the plan, so the caller can
/// persist it afterwards. A failing resource is counted and reported, it does
/// not stop the others.
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (dry_run, jobs, verbose)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback
///
/// # Returns
/// Summary of execution results
pub fn execute<R, P, C>(
    plan: &mut ExecutionPlan<R>,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    R: Resource,
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let total_changes = plan.changes().count();
    let unchanged = plan.total_resources() - total_changes;
    let mut summary = ExecuteSummary {
        no_change: unchanged,
        ..Default::default()
    };

    if total_changes == 0 {
        return Ok(summary);
    }

    if opts.dry_run {
        for entry in plan.changes() {
            let result = ApplyResult::Skipped {
                reason: format!("dry run: would {}", entry.action.verb()),
            };
            progress.on_resource_complete(&entry.resource.address(), &result);
            summary.add_result(&result);
        }
        return Ok(summary);
    }

    if !confirm.confirm(&format!("Apply {total_changes} change(s)?"))? {
        summary.skipped = total_changes;
        return Ok(summary);
    }

    let ctx = ApplyContext::new(false, opts.verbose);
    let (parallel, sequential): (Vec<_>, Vec<_>) = plan
        .entries
        .iter_mut()
        .filter(|entry| entry.action.is_change())
        .partition(|entry| opts.jobs > 1 && entry.resource.can_parallelize());

    if parallel.len() > 1 {
        progress.on_batch_start(parallel.len(), true);
        for (address, result) in execute_parallel(parallel, opts.jobs, &ctx)? {
            progress.on_resource_complete(&address, &result);
            summary.add_result(&result);
        }
        progress.on_batch_complete();
    } else if !parallel.is_empty() {
        execute_sequential(parallel, &ctx, progress, &mut summary);
    }

    if !sequential.is_empty() {
        execute_sequential(sequential, &ctx, progress, &mut summary);
    }

    Ok(summary)
}

fn execute_sequential<R: Resource, P: ProgressCallback>(
    entries: Vec<&mut PlannedResource<R>>,
    ctx: &ApplyContext,
    progress: &mut P,
    summary: &mut ExecuteSummary,
) {
    progress.on_batch_start(entries.len(), false);
    for entry in entries {
        let address = entry.resource.address();
        progress.on_resource_start(&address, &entry.action);
        let result = apply_entry(entry, ctx);
        progress.on_resource_complete(&address, &result);
        summary.add_result(&result);
    }
    progress.on_batch_complete();
}

/// Execute resources in parallel using rayon
///
/// Results come back in plan order.
fn execute_parallel<R: Resource>(
    entries: Vec<&mut PlannedResource<R>>,
    jobs: usize,
    ctx: &ApplyContext,
) -> Result<Vec<(String, ApplyResult)>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {e}"))?;

    Ok(pool.install(|| {
        entries
            .into_par_iter()
            .map(|entry| {
                let result = apply_entry(entry, ctx);
                (entry.resource.address(), result)
            })
            .collect()
    }))
}

/// Apply a single planned action, splitting a replacement into delete + create
fn apply_entry<R: Resource>(entry: &mut PlannedResource<R>, ctx: &ApplyContext) -> ApplyResult {
    let outcome = match &entry.action {
        Action::Replace { .. } => entry
            .resource
            .apply(&Action::Delete, ctx)
            .and_then(|_| entry.resource.apply(&Action::Create, ctx))
            .map(|_| ApplyResult::Replaced),
        action => entry.resource.apply(action, ctx),
    };

    match outcome {
        Ok(result) => result,
        Err(e) => ApplyResult::Failed {
            error: format!("{e:#}"),
        },
    }
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple<R: Resource>(
    plan: &mut ExecutionPlan<R>,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    execute(plan, opts, &mut NoProgress, &mut AutoConfirm)
}
