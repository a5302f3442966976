//! Terminal progress and confirmation for plan execution.

use anyhow::Result;
use colored::Colorize;
use declarative::{Action, ApplyResult, ConfirmCallback, ExecuteSummary, ProgressCallback};

use crate::ui;

/// Prints one line per applied project
pub struct ConsoleProgress {
    quiet: bool,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_batch_start(&mut self, count: usize, parallel: bool) {
        if self.quiet {
            return;
        }
        println!();
        let mode = if parallel { " in parallel" } else { "" };
        println!("  {} Applying {count} project(s){mode}...", "→".cyan());
    }

    fn on_resource_start(&mut self, address: &str, action: &Action) {
        log::info!("{} {address}", action.verb());
    }

    fn on_resource_complete(&mut self, address: &str, result: &ApplyResult) {
        let line = match result {
            ApplyResult::NoChange => format!("{} {address}", "○".dimmed()),
            ApplyResult::Created => format!("{} {address} created", "✓".green()),
            ApplyResult::Modified => format!("{} {address} updated", "✓".green()),
            ApplyResult::Replaced => format!("{} {address} replaced", "✓".green()),
            ApplyResult::Removed => format!("{} {address} deleted", "✓".green()),
            ApplyResult::Skipped { reason } => {
                format!("{} {address} {}", "⊘".yellow(), reason.dimmed())
            }
            ApplyResult::Failed { error } => {
                ui::error(&format!("{address}: {error}"));
                return;
            }
        };
        if !self.quiet {
            println!("    {line}");
        }
    }

    fn on_batch_complete(&mut self) {}
}

/// Asks on the terminal unless `--yes` was given
pub struct TerminalConfirm {
    yes: bool,
}

impl TerminalConfirm {
    pub fn new(yes: bool) -> Self {
        Self { yes }
    }
}

impl ConfirmCallback for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }

        println!();
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        if !confirmed {
            println!();
            println!("  {} Aborted", "✗".red());
        }
        Ok(confirmed)
    }
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return;
    }
    if summary.total_changes() == 0 && summary.failed == 0 {
        if summary.skipped == 0 {
            println!("  {} Nothing to do", "✓".green().bold());
        }
        return;
    }

    if summary.is_success() {
        println!("  {} Registry converged", "✓".green().bold());
    } else {
        println!("  {} Apply finished with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} project(s) created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} project(s) updated", summary.modified);
    }
    if summary.replaced > 0 {
        println!("    • {} project(s) replaced", summary.replaced);
    }
    if summary.removed > 0 {
        println!("    • {} project(s) deleted", summary.removed);
    }
    if summary.skipped > 0 {
        println!("    • {} project(s) skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "project(s)".red());
    }
}
