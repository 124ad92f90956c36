// SPDX-FileCopyrightText: 2026 sw developers
// SPDX-License-Identifier: MIT

use sw::{
    check_binaries,
    config::{Config, General, Overrides, Settings},
    path::default_config_file,
    vcs::BinInvoker,
    workspace::{BranchName, Workspace},
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use inquire::Confirm;
use std::{
    path::{Path, PathBuf},
    process::exit,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about = "Keep svn branch checkouts and git-svn mirrors in sync with a central git repository",
    override_usage = "sw [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short = 'c', long, value_name = "path", global = true)]
    config_file: Option<PathBuf>,

    /// Directory holding the svn branch checkouts.
    #[arg(short = 's', long, value_name = "path", global = true)]
    svn_dir: Option<PathBuf>,

    /// Directory holding the git-svn mirror repositories.
    #[arg(short = 'g', long, value_name = "path", global = true)]
    git_svn_dir: Option<PathBuf>,

    /// Path of the central git repository.
    #[arg(short = 'r', long, value_name = "path", global = true)]
    repository: Option<PathBuf>,

    /// Base URL of the svn project.
    #[arg(short = 'u', long, value_name = "url", global = true)]
    svn_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let config_file = match &self.config_file {
            Some(path) => path.clone(),
            None => default_config_file()?,
        };
        let overrides = Overrides {
            svn_dir: self.svn_dir,
            git_svn_dir: self.git_svn_dir,
            repository: self.repository,
            svn_url: self.svn_url,
        };

        match self.command {
            Command::Initcfg(opts) => run_initcfg(&config_file, overrides, opts),
            Command::Update => run_update(&open_workspace(&config_file, overrides)?),
            Command::List => run_list(&open_workspace(&config_file, overrides)?),
            Command::AddBranch(opts) => {
                run_add_branch(&open_workspace(&config_file, overrides)?, opts)
            }
            Command::RmBranch(opts) => {
                run_rm_branch(&open_workspace(&config_file, overrides)?, opts)
            }
            Command::Commit(opts) => run_commit(&open_workspace(&config_file, overrides)?, opts),
            Command::LsRemote => run_ls_remote(&open_workspace(&config_file, overrides)?),
        }
    }
}

/// Merge file configuration with command line overrides, and stand up
/// a workspace over the real binaries.
fn open_workspace(config_file: &Path, overrides: Overrides) -> Result<Workspace> {
    let settings = Settings::merge(Config::load(config_file)?, overrides);
    check_binaries(&BinInvoker)?;

    Ok(Workspace::new(settings))
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Initialize the configuration file from the global options.
    #[command(override_usage = "sw [options] initcfg [--force]")]
    Initcfg(InitcfgOptions),

    /// Update all checkouts, mirrors, and the central repository.
    #[command(override_usage = "sw [options] update")]
    Update,

    /// List all known branches.
    #[command(override_usage = "sw [options] list")]
    List,

    /// Add a branch checkout and its git-svn mirror.
    #[command(alias = "add_branch", override_usage = "sw [options] add-branch <name>")]
    AddBranch(AddBranchOptions),

    /// Remove a branch checkout and its git-svn mirror.
    #[command(alias = "rm_branch", override_usage = "sw [options] rm-branch [--force] <name>")]
    RmBranch(RmBranchOptions),

    /// Commit the current git branch onto a svn branch.
    #[command(override_usage = "sw [options] commit <destbranch>")]
    Commit(CommitOptions),

    /// List branches available on the svn server.
    #[command(alias = "ls_remote", override_usage = "sw [options] ls-remote")]
    LsRemote,
}

#[derive(Parser, Clone, Debug)]
struct InitcfgOptions {
    /// Force the overwrite of the configuration file.
    #[arg(short, long)]
    force: bool,
}

#[derive(Parser, Clone, Debug)]
struct AddBranchOptions {
    /// Name of the svn branch to track.
    #[arg(value_name = "name")]
    name: BranchName,
}

#[derive(Parser, Clone, Debug)]
struct RmBranchOptions {
    /// Name of the tracked branch to remove.
    #[arg(value_name = "name")]
    name: BranchName,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    force: bool,
}

#[derive(Parser, Clone, Debug)]
struct CommitOptions {
    /// The svn branch to commit the current git branch onto.
    #[arg(value_name = "destbranch")]
    destbranch: BranchName,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_initcfg(config_file: &Path, overrides: Overrides, opts: InitcfgOptions) -> Result<()> {
    if config_file.exists() && !opts.force {
        bail!(
            "configuration file {:?} already exists, pass --force to overwrite it",
            config_file.display()
        );
    }

    let config = Config {
        general: General {
            svn_dir: overrides.svn_dir,
            git_svn_dir: overrides.git_svn_dir,
            repository: overrides.repository,
            svn_url: overrides.svn_url,
        },
    };
    config.save(config_file)?;
    info!("wrote configuration to {:?}", config_file.display());

    Ok(())
}

fn run_update(workspace: &Workspace) -> Result<()> {
    workspace.update()?;

    Ok(())
}

fn run_list(workspace: &Workspace) -> Result<()> {
    for name in workspace.list()? {
        println!("{name}");
    }

    Ok(())
}

fn run_add_branch(workspace: &Workspace, opts: AddBranchOptions) -> Result<()> {
    workspace.add_branch(&opts.name)?;

    Ok(())
}

fn run_rm_branch(workspace: &Workspace, opts: RmBranchOptions) -> Result<()> {
    if !opts.force {
        let confirmed = Confirm::new(
            format!("remove branch {:?} and both of its local directories?", opts.name.as_str())
                .as_str(),
        )
        .with_default(false)
        .prompt()?;

        if !confirmed {
            info!("left branch {} alone", opts.name);
            return Ok(());
        }
    }

    workspace.rm_branch(&opts.name)?;

    Ok(())
}

fn run_commit(workspace: &Workspace, opts: CommitOptions) -> Result<()> {
    workspace.commit(&opts.destbranch)?;

    Ok(())
}

fn run_ls_remote(workspace: &Workspace) -> Result<()> {
    for name in workspace.ls_remote()? {
        println!("{name}");
    }

    Ok(())
}
