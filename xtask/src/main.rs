use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the buildsync test suite with cargo nextest
    Test {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
        /// Only run tests whose name matches this filter
        filter: Option<String>,
    },
    /// Check formatting and run clippy with warnings denied
    Lint,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Test {
            profile,
            release,
            filter,
        } => run_tests(profile, release, filter)?,
        Commands::Lint => run_lint()?,
    }
    Ok(())
}

fn run_tests(profile: Option<String>, release: bool, filter: Option<String>) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["nextest", "run", "-p", "buildsync"]);
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    if let Some(filter) = filter {
        cmd.arg(filter);
    }
    run(cmd, "cargo nextest run")
}

fn run_lint() -> Result<()> {
    let mut fmt = Command::new("cargo");
    fmt.args(["fmt", "--all", "--", "--check"]);
    run(fmt, "cargo fmt")?;

    let mut clippy = Command::new("cargo");
    clippy.args(["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]);
    run(clippy, "cargo clippy")
}

fn run(mut cmd: Command, label: &str) -> Result<()> {
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{label} failed");
    }
    Ok(())
}
