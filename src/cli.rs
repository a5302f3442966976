use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "regsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declaratively manage Harbor registry projects", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "REGSYNC_CONFIG",
        default_value = "regsync.toml"
    )]
    pub config: PathBuf,

    #[command(flatten)]
    pub registry: RegistryArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Registry connection overrides; each wins over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct RegistryArgs {
    /// Registry URL
    #[arg(long, global = true, env = "HARBOR_URL")]
    pub url: Option<String>,

    /// Registry username
    #[arg(long, global = true, env = "HARBOR_USERNAME")]
    pub username: Option<String>,

    /// Registry password
    #[arg(long, global = true, env = "HARBOR_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Refresh state and show what apply would change
    Plan(PlanArgs),

    /// Create, update or replace projects to match the config
    Apply(ApplyArgs),

    /// Delete every managed project
    Destroy(DestroyArgs),

    /// Re-read every managed project and report drift
    Refresh(TargetArgs),

    /// Adopt an existing project into state
    Import {
        /// Project name as declared in the config
        name: String,

        /// Project identity, e.g. /projects/12 or 12
        id: String,
    },

    /// Show recorded state
    Show {
        /// Only this project
        name: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Limit to a target: "project" or "project.<name>"
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Limit to a target: "project" or "project.<name>"
    #[arg(short, long)]
    pub target: Option<String>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Limit to a target: "project" or "project.<name>"
    #[arg(short, long)]
    pub target: Option<String>,

    /// Show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Number of projects applied in parallel
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Limit to a target: "project" or "project.<name>"
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from([
            "regsync", "-vv", "apply", "--target", "project.team-a", "--jobs", "2", "--yes",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.target.as_deref(), Some("project.team-a"));
        assert_eq!(args.jobs, 2);
        assert!(args.yes);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_parse_import() {
        let cli = Cli::try_parse_from(["regsync", "import", "team-a", "/projects/12"]).unwrap();
        let Command::Import { name, id } = cli.command else {
            panic!("expected import");
        };
        assert_eq!(name, "team-a");
        assert_eq!(id, "/projects/12");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "regsync",
            "plan",
            "--config",
            "/etc/regsync.toml",
            "--url",
            "https://harbor.local",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/regsync.toml"));
        assert_eq!(cli.registry.url.as_deref(), Some("https://harbor.local"));
    }
}
