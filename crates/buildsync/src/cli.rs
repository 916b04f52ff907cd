//! Command-line host for the synchronize command.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::adapt::Adaptable;
use crate::app::coalesce::Serialized;
use crate::app::dispatch::{DISPATCH_POLICY, Dispatcher, RecordingSynchronizer};
use crate::app::report::SyncReport;
use crate::app::selection::{EditorInput, SelectionEvent};
use crate::app::trigger::ProjectSynchronizer;
use crate::infra::config::{Config, find_workspace_root};
use crate::infra::logging;
use crate::infra::runner::PoolRunner;
use crate::infra::workspace::Workspace;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(author, version, about = "Synchronize the builds behind a workspace selection")]
pub struct Cli {
    /// Workspace root. Defaults to the nearest directory containing `.buildsync/` or `.git`.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
    /// Workspace manifest. Defaults to `workspace.manifest` from the configuration.
    #[arg(long, global = true)]
    pub manifest: Option<PathBuf>,
    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize every build touched by the given paths.
    Sync {
        /// Selected paths, relative to the workspace root unless absolute.
        paths: Vec<PathBuf>,
        /// File open in the active editor, used when no paths are selected.
        #[arg(long)]
        editor: Option<PathBuf>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the builds declared in the workspace manifest.
    Builds,
    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse arguments from the process and run.
pub fn main() -> Result<()> {
    run(Cli::parse(), &mut io::stdout().lock())
}

pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "buildsync", out);
        return Ok(());
    }

    let root = workspace_root(cli.root.as_deref())?;
    let config = Config::load_for_root(&root)?;
    logging::init_with_level(logging::with_verbosity(
        logging::parse_level(&config.logging.level),
        cli.verbose,
    ));

    let manifest = cli
        .manifest
        .clone()
        .unwrap_or_else(|| config.workspace.manifest_path(&root));
    let workspace = Arc::new(Workspace::load(&manifest, &root)?);

    match cli.command {
        Commands::Sync {
            paths,
            editor,
            json,
        } => {
            let report = sync(&config, workspace, &paths, editor.as_deref())?;
            if json {
                writeln!(out, "{}", report.render_json()?)?;
            } else {
                write!(out, "{}", report.render_text())?;
            }
        }
        Commands::Builds => {
            for (name, build) in workspace.builds() {
                writeln!(out, "{name}\t{build}")?;
            }
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }
    Ok(())
}

fn workspace_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }
    let cwd = std::env::current_dir().context("unable to determine working directory")?;
    Ok(find_workspace_root(&cwd).unwrap_or(cwd))
}

fn sync(
    config: &Config,
    workspace: Arc<Workspace>,
    paths: &[PathBuf],
    editor: Option<&Path>,
) -> Result<SyncReport> {
    let event = selection_event(&workspace, paths, editor);
    let candidates = event
        .as_structured_selection()
        .map(<[_]>::len)
        .unwrap_or_else(|| usize::from(event.active_editor().is_some()));

    let recorder = Arc::new(Serialized::new(RecordingSynchronizer::new()));
    let runner = Arc::new(PoolRunner::from_config(config)?);
    let trigger = ProjectSynchronizer::new(
        workspace.clone(),
        workspace.clone(),
        Dispatcher::new(recorder.clone(), runner.clone()),
    );

    let builds = trigger.execute(&event);
    if !runner.wait_idle(DRAIN_TIMEOUT) {
        tracing::warn!("synchronization tasks still running at exit");
    }
    tracing::debug!(recorded = recorder.inner().requests().len(), "synchronization finished");

    Ok(SyncReport::new(candidates, DISPATCH_POLICY, builds))
}

fn selection_event<'a>(
    workspace: &'a Workspace,
    paths: &[PathBuf],
    editor: Option<&Path>,
) -> SelectionEvent<'a> {
    let mut event = if paths.is_empty() {
        SelectionEvent::empty()
    } else {
        SelectionEvent::structured(
            paths
                .iter()
                .map(|path| Box::new(workspace.path(path.clone())) as Box<dyn Adaptable + 'a>),
        )
    };

    if let Some(path) = editor {
        let input = match workspace.resource_for(path) {
            Some(resource) => EditorInput::File(resource),
            None => EditorInput::Buffer {
                name: path.display().to_string(),
            },
        };
        event = event.with_editor(input);
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sync_arguments() {
        let cli = Cli::try_parse_from([
            "buildsync",
            "-vv",
            "sync",
            "shop/app/build.gradle",
            "--editor",
            "tools/build.gradle",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Sync {
                paths,
                editor,
                json,
            } => {
                assert_eq!(paths, vec![PathBuf::from("shop/app/build.gradle")]);
                assert_eq!(editor, Some(PathBuf::from("tools/build.gradle")));
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
