// SPDX-FileCopyrightText: 2026 sw developers
// SPDX-License-Identifier: MIT

//! External version control invocation.
//!
//! Everything substantive that sw does is delegated to the `git`,
//! `svn`, and `svnversion` binaries. This module provides the thin
//! invocation layer over [`std::process::Command`] that the rest of
//! the crate goes through, with a trait seam so workspace logic can be
//! exercised against a recording fake.
//!
//! Exit codes and text output of the external binaries are trusted
//! as-is: a zero exit status is success, anything else is an error
//! carrying whatever the binary printed.

use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::debug;

/// Name of the git binary.
pub const GIT: &str = "git";

/// Name of the svn binary.
pub const SVN: &str = "svn";

/// Name of the svnversion binary.
pub const SVNVERSION: &str = "svnversion";

/// Layer of indirection for external command invocation.
pub trait Invoke {
    /// Run command inside target directory with captured output.
    ///
    /// Returns the command's stdout with trailing newline chomped.
    /// Non-zero exit status is an error carrying whatever the command
    /// printed to stderr.
    fn run(
        &self,
        dir: &Path,
        bin: &str,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<String>;

    /// Run command inside target directory with inherited stdio.
    ///
    /// Blocks the current process so the command can interact with the
    /// user directly, e.g. to prompt for svn credentials.
    fn run_interactive(
        &self,
        dir: &Path,
        bin: &str,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<()>;
}

/// Command invocation through the real binaries on `PATH`.
#[derive(Debug, Default, Clone)]
pub struct BinInvoker;

impl Invoke for BinInvoker {
    fn run(
        &self,
        dir: &Path,
        bin: &str,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<String> {
        let args = args.into_iter().map(Into::into).collect::<Vec<_>>();
        debug!("run {bin} {:?} in {:?}", args, dir.display());
        check_work_dir(dir)?;

        let output = Command::new(bin)
            .args(&args)
            .current_dir(dir)
            .output()
            .map_err(|err| spawn_error(bin, err))?;

        let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
        let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                bin: bin.into(),
                output: chomp(if stderr.is_empty() { stdout } else { stderr }),
            });
        }

        Ok(chomp(stdout))
    }

    fn run_interactive(
        &self,
        dir: &Path,
        bin: &str,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<()> {
        let args = args.into_iter().map(Into::into).collect::<Vec<_>>();
        debug!("run interactive {bin} {:?} in {:?}", args, dir.display());
        check_work_dir(dir)?;

        let status = Command::new(bin)
            .args(&args)
            .current_dir(dir)
            .spawn()
            .map_err(|err| spawn_error(bin, err))?
            .wait()
            .map_err(VcsError::Syscall)?;

        if !status.success() {
            return Err(VcsError::CommandFailed {
                bin: bin.into(),
                output: String::new(),
            });
        }

        Ok(())
    }
}

/// Ensure all needed binaries are available on `PATH`.
///
/// Probes every binary with `--version` through target invoker, even
/// after the first miss, so that all missing ones are reported
/// together. A binary that is present but fails the probe is left for
/// the real invocation to complain about.
///
/// # Errors
///
/// - Return [`VcsError::MissingBinaries`] naming every binary that
///   cannot be spawned.
pub fn check_binaries(invoker: &impl Invoke) -> Result<()> {
    let mut missing = Vec::new();
    for bin in [GIT, SVN, SVNVERSION] {
        if let Err(VcsError::MissingBinaries { missing: mut bins }) =
            invoker.run(Path::new("."), bin, ["--version"])
        {
            missing.append(&mut bins);
        }
    }

    if !missing.is_empty() {
        return Err(VcsError::MissingBinaries { missing });
    }

    Ok(())
}

// Spawning inside a nonexistent directory also surfaces as NotFound,
// so the working directory is checked before NotFound gets pinned on
// the binary.
fn check_work_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(VcsError::MissingWorkDir {
            path: dir.to_path_buf(),
        });
    }

    Ok(())
}

fn spawn_error(bin: &str, err: std::io::Error) -> VcsError {
    if err.kind() == ErrorKind::NotFound {
        VcsError::MissingBinaries {
            missing: vec![bin.to_string()],
        }
    } else {
        VcsError::Syscall(err)
    }
}

// INVARIANT: Chomp trailing newlines.
fn chomp(message: String) -> String {
    message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message)
}

/// External command invocation error types.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// Command ran but exited with non-zero status.
    #[error("command {bin:?} failed:\n{output}")]
    CommandFailed { bin: String, output: String },

    /// Command could not be spawned or waited on.
    #[error(transparent)]
    Syscall(#[from] std::io::Error),

    /// Needed binaries are not available on `PATH`.
    #[error("the following binaries are not available: {}", missing.join(", "))]
    MissingBinaries { missing: Vec<String> },

    /// Working directory for a command does not exist.
    #[error("working directory {:?} does not exist", path.display())]
    MissingWorkDir { path: PathBuf },
}

/// Friendly result alias :3
pub type Result<T, E = VcsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn run_chomps_trailing_newline() -> anyhow::Result<()> {
        let result = BinInvoker.run(Path::new("."), "echo", ["hello world"])?;
        assert_eq!(result, "hello world");

        Ok(())
    }

    #[test]
    fn run_reports_non_zero_exit() {
        let result = BinInvoker.run(Path::new("."), "false", Vec::<String>::new());
        assert!(matches!(
            result,
            Err(VcsError::CommandFailed { bin, .. }) if bin == "false"
        ));
    }

    #[test]
    fn run_reports_missing_binary() {
        let result = BinInvoker.run(Path::new("."), "sw-no-such-binary", Vec::<String>::new());
        assert!(matches!(
            result,
            Err(VcsError::MissingBinaries { missing }) if missing == ["sw-no-such-binary"]
        ));
    }

    #[test]
    fn run_reports_missing_work_dir_not_missing_binary() {
        let result = BinInvoker.run(Path::new("/definitely/not/a/dir"), "echo", ["hello"]);
        assert!(matches!(
            result,
            Err(VcsError::MissingWorkDir { path }) if path == Path::new("/definitely/not/a/dir")
        ));
    }

    /// Invocation fake whose listed binaries are absent from `PATH`.
    struct WithoutBins(Vec<&'static str>);

    impl Invoke for WithoutBins {
        fn run(
            &self,
            _dir: &Path,
            bin: &str,
            _args: impl IntoIterator<Item = impl Into<OsString>>,
        ) -> Result<String> {
            if self.0.contains(&bin) {
                return Err(VcsError::MissingBinaries {
                    missing: vec![bin.to_string()],
                });
            }

            Ok(String::new())
        }

        fn run_interactive(
            &self,
            _dir: &Path,
            _bin: &str,
            _args: impl IntoIterator<Item = impl Into<OsString>>,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn check_binaries_reports_all_missing_together() {
        let result = check_binaries(&WithoutBins(vec![SVN, SVNVERSION]));
        assert!(matches!(
            result,
            Err(VcsError::MissingBinaries { missing }) if missing == [SVN, SVNVERSION]
        ));
    }

    #[test]
    fn check_binaries_accepts_full_toolchain() {
        assert!(check_binaries(&WithoutBins(Vec::new())).is_ok());
    }
}
