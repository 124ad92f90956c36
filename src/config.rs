// SPDX-FileCopyrightText: 2026 sw developers
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the `.swrc` configuration file, and the merge
//! rules between that file and the command line. The file is a single
//! `[general]` table of string values:
//!
//! ```toml
//! [general]
//! svn_dir = "~/work/svn"
//! git_svn_dir = "~/work/git-svn"
//! repository = "~/work/main-repo"
//! svn_url = "https://svn.example.org/project"
//! ```
//!
//! Every value given on the command line wins over the file. A setting
//! absent from both places only becomes an error when a subcommand
//! actually needs it.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Configuration file layout.
///
/// Mirrors the on-disk `.swrc` file. All values are optional so that a
/// partially filled file still parses; [`Settings`] decides later which
/// values a given operation actually requires.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Config {
    /// The one and only section of the configuration file.
    #[serde(default)]
    pub general: General,
}

impl Config {
    /// Load configuration from target file.
    ///
    /// A missing file is not an error, and yields an empty
    /// configuration instead.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if the file exists but cannot be
    ///   read.
    /// - Return [`ConfigError::Deserialize`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            source: err,
            path: path.to_path_buf(),
        })?;

        content.parse()
    }

    /// Save configuration to target file.
    ///
    /// Overwrite policy is left to the caller.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Serialize`] if rendering fails.
    /// - Return [`ConfigError::Write`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::ser::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, content).map_err(|err| ConfigError::Write {
            source: err,
            path: path.to_path_buf(),
        })?;

        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path and URL value.
        config.general.svn_dir = expand_path(config.general.svn_dir)?;
        config.general.git_svn_dir = expand_path(config.general.git_svn_dir)?;
        config.general.repository = expand_path(config.general.repository)?;
        config.general.svn_url = expand_str(config.general.svn_url)?;

        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// The `[general]` section of the configuration file.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct General {
    /// Directory holding the plain svn branch checkouts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svn_dir: Option<PathBuf>,

    /// Directory holding the git-svn mirror repositories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_svn_dir: Option<PathBuf>,

    /// Path of the central git repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<PathBuf>,

    /// Base URL of the svn project, the directory containing `trunk/`
    /// and `branches/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svn_url: Option<String>,
}

/// Values taken from the command line that override the file.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Overrides {
    pub svn_dir: Option<PathBuf>,
    pub git_svn_dir: Option<PathBuf>,
    pub repository: Option<PathBuf>,
    pub svn_url: Option<String>,
}

/// Merged view of configuration file and command line.
///
/// Accessors fail with [`ConfigError::MissingSetting`] naming the key
/// when a setting was given in neither place.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Settings {
    svn_dir: Option<PathBuf>,
    git_svn_dir: Option<PathBuf>,
    repository: Option<PathBuf>,
    svn_url: Option<String>,
}

impl Settings {
    /// Merge command line overrides on top of file configuration.
    pub fn merge(config: Config, overrides: Overrides) -> Self {
        Self {
            svn_dir: overrides.svn_dir.or(config.general.svn_dir),
            git_svn_dir: overrides.git_svn_dir.or(config.general.git_svn_dir),
            repository: overrides.repository.or(config.general.repository),
            svn_url: overrides.svn_url.or(config.general.svn_url),
        }
    }

    /// Directory holding the plain svn branch checkouts.
    pub fn svn_dir(&self) -> Result<&Path> {
        self.svn_dir
            .as_deref()
            .ok_or(ConfigError::MissingSetting { key: "svn_dir" })
    }

    /// Directory holding the git-svn mirror repositories.
    pub fn git_svn_dir(&self) -> Result<&Path> {
        self.git_svn_dir
            .as_deref()
            .ok_or(ConfigError::MissingSetting { key: "git_svn_dir" })
    }

    /// Path of the central git repository.
    pub fn repository(&self) -> Result<&Path> {
        self.repository
            .as_deref()
            .ok_or(ConfigError::MissingSetting { key: "repository" })
    }

    /// Base URL of the svn project.
    pub fn svn_url(&self) -> Result<&str> {
        self.svn_url
            .as_deref()
            .ok_or(ConfigError::MissingSetting { key: "svn_url" })
    }
}

fn expand_path(path: Option<PathBuf>) -> Result<Option<PathBuf>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let expanded = shellexpand::full(path.to_string_lossy().as_ref())
        .map_err(ConfigError::ShellExpansion)?
        .into_owned();

    Ok(Some(PathBuf::from(expanded)))
}

fn expand_str(value: Option<String>) -> Result<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };

    Ok(Some(
        shellexpand::full(value.as_str())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file cannot be read from.
    #[error("failed to read configuration file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Configuration file cannot be written to.
    #[error("failed to write configuration file at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Setting given neither on the command line nor in the file.
    #[error("setting {key:?} was given neither on the command line nor in the configuration file")]
    MissingSetting { key: &'static str },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("WORK", "/home/blah/work")])]
    fn deserialize_config() -> anyhow::Result<()> {
        let result: Config = r#"
            [general]
            svn_dir = "$WORK/svn"
            git_svn_dir = "$WORK/git-svn"
            repository = "$WORK/main-repo"
            svn_url = "https://svn.blah.org/project"
        "#
        .parse()?;

        let expect = Config {
            general: General {
                svn_dir: Some("/home/blah/work/svn".into()),
                git_svn_dir: Some("/home/blah/work/git-svn".into()),
                repository: Some("/home/blah/work/main-repo".into()),
                svn_url: Some("https://svn.blah.org/project".into()),
            },
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn serialize_config() {
        let result = Config {
            general: General {
                svn_dir: Some("/home/blah/work/svn".into()),
                git_svn_dir: Some("/home/blah/work/git-svn".into()),
                repository: Some("/home/blah/work/main-repo".into()),
                svn_url: Some("https://svn.blah.org/project".into()),
            },
        }
        .to_string();

        let expect = indoc! {r#"
            [general]
            svn_dir = "/home/blah/work/svn"
            git_svn_dir = "/home/blah/work/git-svn"
            repository = "/home/blah/work/main-repo"
            svn_url = "https://svn.blah.org/project"
        "#};

        assert_eq!(result, expect);
    }

    #[test]
    fn deserialize_empty_config() -> anyhow::Result<()> {
        let result: Config = "".parse()?;
        assert_eq!(result, Config::default());

        Ok(())
    }

    #[sealed_test]
    fn load_missing_file_yields_default() -> anyhow::Result<()> {
        let result = Config::load("no-such-swrc")?;
        assert_eq!(result, Config::default());

        Ok(())
    }

    #[sealed_test]
    fn save_then_load_round_trip() -> anyhow::Result<()> {
        let config = Config {
            general: General {
                svn_dir: Some("/srv/svn".into()),
                git_svn_dir: Some("/srv/git-svn".into()),
                repository: Some("/srv/main-repo".into()),
                svn_url: Some("https://svn.blah.org/project".into()),
            },
        };
        config.save("swrc")?;

        let result = Config::load("swrc")?;
        assert_eq!(result, config);

        Ok(())
    }

    #[test]
    fn merge_prefers_command_line() {
        let config = Config {
            general: General {
                svn_dir: Some("/from/file/svn".into()),
                git_svn_dir: Some("/from/file/git-svn".into()),
                repository: Some("/from/file/main-repo".into()),
                svn_url: Some("https://svn.blah.org/file".into()),
            },
        };
        let overrides = Overrides {
            svn_dir: Some("/from/cli/svn".into()),
            svn_url: Some("https://svn.blah.org/cli".into()),
            ..Default::default()
        };

        let settings = Settings::merge(config, overrides);
        assert_eq!(settings.svn_dir().unwrap(), Path::new("/from/cli/svn"));
        assert_eq!(
            settings.git_svn_dir().unwrap(),
            Path::new("/from/file/git-svn")
        );
        assert_eq!(
            settings.repository().unwrap(),
            Path::new("/from/file/main-repo")
        );
        assert_eq!(settings.svn_url().unwrap(), "https://svn.blah.org/cli");
    }

    #[test]
    fn merge_reports_missing_setting_by_key() {
        let settings = Settings::merge(Config::default(), Overrides::default());
        let error = settings.svn_url().unwrap_err();
        assert_eq!(
            error.to_string(),
            "setting \"svn_url\" was given neither on the command line nor in the configuration file"
        );
    }
}
