// SPDX-FileCopyrightText: 2026 sw developers
// SPDX-License-Identifier: MIT

//! Branch workspace management.
//!
//! A workspace is the pair of directories that sw keeps synchronized
//! with a central git repository: `svn_dir` holds one plain svn
//! checkout per branch, and `git_svn_dir` holds one git-svn mirror per
//! branch. The name of a branch is the basename of its directory on
//! both sides.
//!
//! Branches map to svn URLs the usual way: `trunk` lives at
//! `<svn_url>/trunk`, everything else at `<svn_url>/branches/<name>`.
//! The git-svn mirror of a branch is registered as a remote of the
//! central repository under the branch's name, so a plain
//! `git fetch --all` in the central repository picks up every mirror.
//!
//! All operations are sequential, and every substantive step is
//! delegated to the external binaries through [`Invoke`].

use crate::{
    config::{ConfigError, Settings},
    vcs::{BinInvoker, Invoke, VcsError, GIT, SVN, SVNVERSION},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{info, instrument, warn};

const NO_ARGS: [&str; 0] = [];

/// Name of a svn branch tracked by the workspace.
///
/// Doubles as the directory basename of the branch's svn checkout and
/// git-svn mirror, and as the remote name inside the central
/// repository. Names with path separators are rejected so that a
/// branch can never escape the workspace directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName(String);

impl BranchName {
    /// Treat branch name as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Map branch name to its svn URL under target project base URL.
    ///
    /// `trunk` is special cased to `<base>/trunk`; every other name
    /// maps to `<base>/branches/<name>`.
    pub fn url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        if self.0 == "trunk" {
            format!("{base}/trunk")
        } else {
            format!("{base}/branches/{}", self.0)
        }
    }
}

impl FromStr for BranchName {
    type Err = InvalidBranchName;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.is_empty() {
            return Err(InvalidBranchName {
                name: name.into(),
                reason: "name is empty",
            });
        }

        if name.contains(['/', '\\']) {
            return Err(InvalidBranchName {
                name: name.into(),
                reason: "name contains a path separator",
            });
        }

        if name == "." || name == ".." {
            return Err(InvalidBranchName {
                name: name.into(),
                reason: "name is a relative path component",
            });
        }

        Ok(Self(name.into()))
    }
}

impl Display for BranchName {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.0.as_str())
    }
}

/// Rejected branch name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid branch name {name:?}: {reason}")]
pub struct InvalidBranchName {
    name: String,
    reason: &'static str,
}

/// Branch checkouts and mirrors kept in sync with a central git
/// repository.
#[derive(Debug)]
pub struct Workspace<I = BinInvoker>
where
    I: Invoke,
{
    settings: Settings,
    invoker: I,
}

impl Workspace<BinInvoker> {
    /// Construct new workspace over the real binaries on `PATH`.
    pub fn new(settings: Settings) -> Self {
        Self::with_invoker(settings, BinInvoker)
    }
}

impl<I> Workspace<I>
where
    I: Invoke,
{
    /// Construct new workspace over target invoker.
    pub fn with_invoker(settings: Settings, invoker: I) -> Self {
        Self { settings, invoker }
    }

    /// Update every checkout, every mirror, and the central repository.
    ///
    /// Runs `svn update` followed by `svnversion` in each svn checkout,
    /// printing one line per checkout. Then runs `git svn fetch` and
    /// `git rebase git-svn master` in each git-svn mirror. Finishes
    /// with `git fetch --all` in the central repository.
    ///
    /// # Errors
    ///
    /// - Return [`WorkspaceError::Vcs`] if any external command fails.
    #[instrument(skip(self), level = "debug")]
    pub fn update(&self) -> Result<()> {
        for checkout in self.svn_checkouts()? {
            self.invoker.run(&checkout, SVN, ["update"])?;
            let version = self.invoker.run(&checkout, SVNVERSION, NO_ARGS)?;
            println!("{}: updated to \"{}\"", checkout.display(), version.trim());
        }

        for mirror in self.git_svn_mirrors()? {
            info!("fetch and rebase mirror {:?}", mirror.display());
            self.invoker.run(&mirror, GIT, ["svn", "fetch"])?;
            self.invoker.run(&mirror, GIT, ["rebase", "git-svn", "master"])?;
        }

        self.invoker
            .run(self.settings.repository()?, GIT, ["fetch", "--all"])?;

        Ok(())
    }

    /// List known branches, sorted by name.
    ///
    /// A branch is known when it has a git-svn mirror directory.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = self
            .git_svn_mirrors()?
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        names.sort();

        Ok(names)
    }

    /// Add a branch to the workspace.
    ///
    /// Checks the branch out from svn, clones its git-svn mirror, and
    /// registers the mirror as a remote of the central repository under
    /// the branch's name.
    ///
    /// # Errors
    ///
    /// - Return [`WorkspaceError::BranchExists`] if either target
    ///   directory already exists.
    /// - Return [`WorkspaceError::Vcs`] if any external command fails.
    #[instrument(skip(self), level = "debug")]
    pub fn add_branch(&self, branch: &BranchName) -> Result<()> {
        let url = branch.url(self.settings.svn_url()?);
        let svn_dir = self.settings.svn_dir()?;
        let git_svn_dir = self.settings.git_svn_dir()?;
        let checkout = svn_dir.join(branch.as_str());
        let mirror = git_svn_dir.join(branch.as_str());

        for path in [&checkout, &mirror] {
            if path.exists() {
                return Err(WorkspaceError::BranchExists {
                    name: branch.to_string(),
                    path: path.clone(),
                });
            }
        }

        ensure_dir(svn_dir)?;
        ensure_dir(git_svn_dir)?;

        info!("checkout {url} into {:?}", checkout.display());
        self.invoker
            .run_interactive(svn_dir, SVN, ["checkout", url.as_str(), branch.as_str()])?;

        info!("clone {url} into {:?}", mirror.display());
        self.invoker
            .run_interactive(git_svn_dir, GIT, ["svn", "clone", url.as_str(), branch.as_str()])?;

        let repository = self.settings.repository()?;
        self.invoker.run(
            repository,
            GIT,
            [
                "remote",
                "add",
                branch.as_str(),
                mirror.to_string_lossy().as_ref(),
            ],
        )?;
        self.invoker.run(repository, GIT, ["fetch", branch.as_str()])?;

        Ok(())
    }

    /// Remove a branch from the workspace.
    ///
    /// Drops the matching remote from the central repository, then
    /// deletes the branch's svn checkout and git-svn mirror
    /// directories. A remote missing from the central repository is
    /// tolerated.
    ///
    /// # Errors
    ///
    /// - Return [`WorkspaceError::UnknownBranch`] if the branch has
    ///   neither a checkout nor a mirror.
    #[instrument(skip(self), level = "debug")]
    pub fn rm_branch(&self, branch: &BranchName) -> Result<()> {
        let checkout = self.settings.svn_dir()?.join(branch.as_str());
        let mirror = self.settings.git_svn_dir()?.join(branch.as_str());

        if !checkout.exists() && !mirror.exists() {
            return Err(WorkspaceError::UnknownBranch {
                name: branch.to_string(),
            });
        }

        let repository = self.settings.repository()?;
        match self
            .invoker
            .run(repository, GIT, ["remote", "remove", branch.as_str()])
        {
            Ok(_) => {}
            // Only a missing remote is tolerated; git reports it as
            // "error: No such remote: '<name>'".
            Err(VcsError::CommandFailed { ref output, .. })
                if output.contains("No such remote") =>
            {
                warn!("central repository has no remote named {branch}: {output}");
            }
            Err(err) => return Err(err.into()),
        }

        for path in [checkout, mirror] {
            if path.exists() {
                info!("remove {:?}", path.display());
                fs::remove_dir_all(&path).map_err(|err| WorkspaceError::RemoveDir {
                    source: err,
                    path: path.clone(),
                })?;
            }
        }

        Ok(())
    }

    /// Commit the central repository's current branch onto a svn
    /// branch.
    ///
    /// Stages the central repository's current branch inside the
    /// branch's git-svn mirror, rebases it onto the `git-svn` tracking
    /// branch, and hands it to `git svn dcommit`. The staging branch
    /// is deleted afterwards.
    ///
    /// # Errors
    ///
    /// - Return [`WorkspaceError::DetachedHead`] if the central
    ///   repository is not on a branch.
    /// - Return [`WorkspaceError::UnknownBranch`] if the destination
    ///   branch has no git-svn mirror.
    /// - Return [`WorkspaceError::Vcs`] if any external command fails.
    #[instrument(skip(self), level = "debug")]
    pub fn commit(&self, branch: &BranchName) -> Result<()> {
        let repository = self.settings.repository()?;
        let current = self
            .invoker
            .run(repository, GIT, ["rev-parse", "--abbrev-ref", "HEAD"])?;
        if current == "HEAD" {
            return Err(WorkspaceError::DetachedHead);
        }

        let mirror = self.settings.git_svn_dir()?.join(branch.as_str());
        if !mirror.exists() {
            return Err(WorkspaceError::UnknownBranch {
                name: branch.to_string(),
            });
        }

        info!("commit branch {current:?} onto svn branch {branch}");
        self.invoker.run(&mirror, GIT, ["svn", "fetch"])?;
        self.invoker.run(
            &mirror,
            GIT,
            [
                "fetch",
                repository.to_string_lossy().as_ref(),
                current.as_str(),
            ],
        )?;
        self.invoker
            .run(&mirror, GIT, ["checkout", "-B", "sw/dcommit", "FETCH_HEAD"])?;
        self.invoker.run(&mirror, GIT, ["rebase", "git-svn"])?;
        self.invoker.run_interactive(&mirror, GIT, ["svn", "dcommit"])?;
        self.invoker.run(&mirror, GIT, ["checkout", "master"])?;
        self.invoker.run(&mirror, GIT, ["branch", "-D", "sw/dcommit"])?;

        Ok(())
    }

    /// List branches available on the svn server.
    ///
    /// Returns `trunk` first, then the entries of
    /// `svn ls <svn_url>/branches` with trailing slashes stripped,
    /// sorted by name.
    pub fn ls_remote(&self) -> Result<Vec<String>> {
        let base = self.settings.svn_url()?.trim_end_matches('/');
        let listing =
            self.invoker
                .run(Path::new("."), SVN, ["ls", format!("{base}/branches").as_str()])?;

        let mut branches = listing
            .lines()
            .map(|line| line.trim().trim_end_matches('/'))
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        branches.sort();
        branches.insert(0, "trunk".into());

        Ok(branches)
    }

    fn svn_checkouts(&self) -> Result<Vec<PathBuf>> {
        branch_dirs(self.settings.svn_dir()?)
    }

    fn git_svn_mirrors(&self) -> Result<Vec<PathBuf>> {
        branch_dirs(self.settings.git_svn_dir()?)
    }
}

/// List branch directories directly under target directory.
///
/// Entries that are not directories are skipped. A directory that does
/// not exist yet lists as empty rather than failing, so a fresh
/// workspace can run `update` and `list` before its first branch.
fn branch_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let pattern = format!("{}/*", dir.display());
    let mut dirs = Vec::new();
    for entry in glob::glob(pattern.as_str())? {
        let path = entry.map_err(|err| WorkspaceError::Glob {
            source: err.into(),
            pattern: pattern.clone(),
        })?;
        if path.is_dir() {
            dirs.push(path);
        }
    }

    Ok(dirs)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    mkdirp::mkdirp(dir).map_err(|err| WorkspaceError::CreateDir {
        source: err,
        path: dir.to_path_buf(),
    })?;

    Ok(())
}

/// Workspace manipulation error types.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// A required setting is missing.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An external command failed.
    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// Branch name was rejected.
    #[error(transparent)]
    InvalidBranchName(#[from] InvalidBranchName),

    /// Workspace directory pattern was rejected.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Workspace directory could not be globbed.
    #[error("failed to read workspace entry for pattern {pattern:?}")]
    Glob {
        #[source]
        source: std::io::Error,
        pattern: String,
    },

    /// Branch directory could not be created.
    #[error("failed to create directory at {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Branch directory could not be removed.
    #[error("failed to remove directory at {:?}", path.display())]
    RemoveDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Branch already has a checkout or mirror directory.
    #[error("branch {name:?} already exists at {:?}", path.display())]
    BranchExists { name: String, path: PathBuf },

    /// Branch has no checkout or mirror directory.
    #[error("unknown branch {name:?}")]
    UnknownBranch { name: String },

    /// Central repository is not on a branch.
    #[error("central repository is on a detached HEAD, checkout a branch first")]
    DetachedHead,
}

/// Friendly result alias :3
pub type Result<T, E = WorkspaceError> = std::result::Result<T, E>;
