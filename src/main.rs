mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod resource;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, RegistryArgs};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Config file, already expanded
    pub config_path: PathBuf,
    pub registry: RegistryArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_path: paths::expand(&cli.config.to_string_lossy()),
        registry: cli.registry,
    };

    let result = match cli.command {
        Command::Plan(args) => commands::plan::run(&ctx, &args),
        Command::Apply(args) => commands::apply::run(&ctx, &args),
        Command::Destroy(args) => commands::destroy::run(&ctx, &args),
        Command::Refresh(args) => commands::refresh::run(&ctx, args.target.as_deref()),
        Command::Import { name, id } => commands::import::run(&ctx, &name, &id),
        Command::Show { name } => commands::show::run(&ctx, name.as_deref()),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "regsync", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = &result
        && let Some(category) = e.chain().find_map(|cause| {
            cause
                .downcast_ref::<harbor::Error>()
                .map(harbor::Error::category)
        })
    {
        ui::dim(&format!("{category}: {}", category.advice()));
    }

    result
}
