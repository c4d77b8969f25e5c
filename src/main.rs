//! # smelt CLI Entry Point
//!
//! Thin layer over the build pipeline: parses arguments, loads the
//! manifest, resolves the named project entry into a descriptor, installs
//! the console sink, and maps the aggregate outcome onto the exit code
//! (0 = success, 1 = any stage failed).

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use smelt::build::Pipeline;
use smelt::manifest::Manifest;
use smelt::report::{ConsoleSink, Reporter, Severity};

#[derive(Parser)]
#[command(name = "smelt")]
#[command(about = "Declarative build orchestrator for C-family toolchains", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {
    /// Path to the project manifest
    #[arg(short, long, default_value = "smelt.toml")]
    project: PathBuf,

    /// Name of the project entry to build
    #[arg(short, long)]
    name: String,

    /// Compile and link the project (implied when --clean is absent)
    #[arg(short, long)]
    build: bool,

    /// Remove the project's build directory
    #[arg(short, long)]
    clean: bool,

    /// Recompile every source regardless of staleness
    #[arg(short, long)]
    force: bool,

    /// Maximum number of parallel compile processes
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Stop launching jobs after the first failure
    #[arg(long)]
    fail_fast: bool,

    /// Kill any toolchain process still running after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Show debug-level build events
    #[arg(short, long)]
    verbose: bool,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let mut manifest = Manifest::load(&cli.project)?;
    let Some(entry) = manifest.project.remove(&cli.name) else {
        println!(
            "{} project '{}' not found in {}",
            "x".red(),
            cli.name,
            cli.project.display()
        );
        std::process::exit(1);
    };

    let mut desc = entry.into_descriptor(&cli.name);
    let building = cli.build || !cli.clean;
    desc.compile = building;
    desc.link = building;
    desc.clean = cli.clean;
    desc.force = cli.force;
    if let Some(jobs) = cli.jobs {
        desc.jobs = jobs.max(1);
    }
    if cli.fail_fast {
        desc.fail_fast = true;
    }
    if let Some(secs) = cli.timeout {
        desc.timeout = Some(Duration::from_secs(secs));
    }

    let threshold = if cli.verbose {
        Severity::Debug
    } else {
        Severity::Info
    };
    let reporter = Reporter::new(Arc::new(ConsoleSink::new()), threshold);

    if Pipeline::new(&desc, reporter).run() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
