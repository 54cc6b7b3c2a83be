//! Oracle-driven static build runner.
//!
//! `staticpilot run` extracts `task/<archive>` into `source/`, lets the oracle
//! drive the build one shell command at a time, then publishes the static
//! output to `release/dist` together with nginx rewrite rules.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use staticpilot::error::NoArtifactFound;
use staticpilot::exit_codes;
use staticpilot::io::config::{BuildConfig, ConfigOverrides, load_config, render_redacted};
use staticpilot::io::locator::locate;
use staticpilot::io::oracle::ChatCompletionsOracle;
use staticpilot::io::shell::SystemShell;
use staticpilot::logging;
use staticpilot::pipeline::run_pipeline;

#[derive(Parser)]
#[command(
    name = "staticpilot",
    version,
    about = "Oracle-driven static build runner for front-end projects"
)]
struct Cli {
    /// Log debug details of ports and search decisions.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract the task archive, drive the build, and publish the release bundle.
    Run(JobArgs),
    /// Print the directory the artifact locator would publish.
    Locate {
        /// Directory to search (defaults to the current directory).
        dir: Option<PathBuf>,
    },
    /// Print the effective configuration with the API key redacted.
    Config(JobArgs),
}

#[derive(Args)]
struct JobArgs {
    /// Job root containing `task/`; `source/` and `release/` are created here.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// TOML file with configuration defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Oracle round-trips allowed before the build is declared failed.
    #[arg(long)]
    max_steps: Option<u32>,

    /// Model name sent to the chat endpoint.
    #[arg(long)]
    model: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let code = match run(cli.command) {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::for_error(&err)
        }
    };
    std::process::exit(code);
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => cmd_run(&args),
        Command::Locate { dir } => cmd_locate(dir),
        Command::Config(args) => cmd_config(&args),
    }
}

fn cmd_run(args: &JobArgs) -> Result<()> {
    let root = absolute_root(&args.root)?;
    let cfg = load_config(&root, args.config.as_deref(), &overrides(args))?;
    let layout = cfg.layout(&root);
    let oracle = ChatCompletionsOracle::new(&cfg)?;
    let shell = SystemShell::from_config(&cfg);

    let outcome = run_pipeline(&cfg, &layout, &oracle, &shell)?;
    println!("{}", outcome.release_path.display());
    Ok(())
}

fn cmd_locate(dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let working_dirs = BuildConfig::default().layout(&dir).working_dir_names();
    let found =
        locate(&dir, &working_dirs)?.ok_or_else(|| NoArtifactFound { root: dir.clone() })?;
    println!("{}", found.display());
    Ok(())
}

fn cmd_config(args: &JobArgs) -> Result<()> {
    let root = absolute_root(&args.root)?;
    let cfg = load_config(&root, args.config.as_deref(), &overrides(args))?;
    print!("{}", render_redacted(&cfg)?);
    Ok(())
}

fn overrides(args: &JobArgs) -> ConfigOverrides {
    ConfigOverrides {
        max_steps: args.max_steps,
        model: args.model.clone(),
    }
}

fn absolute_root(root: &Path) -> Result<PathBuf> {
    std::path::absolute(root).with_context(|| format!("resolve root {}", root.display()))
}
