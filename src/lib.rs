// SPDX-FileCopyrightText: 2026 sw developers
// SPDX-License-Identifier: MIT

//! Keep svn branch checkouts and git-svn mirrors in sync with a
//! central git repository.
//!
//! sw manages a workspace of one svn checkout and one git-svn mirror
//! per branch, and wires every mirror up as a remote of a central git
//! repository. All version control work is delegated to the `git`,
//! `svn`, and `svnversion` binaries; this crate is configuration
//! loading, argument merging, and sequential invocation of those
//! binaries.

pub mod config;
pub mod path;
pub mod vcs;
pub mod workspace;

pub use config::{Config, General, Overrides, Settings};
pub use path::default_config_file;
pub use vcs::{check_binaries, BinInvoker, Invoke};
pub use workspace::{BranchName, Workspace};
