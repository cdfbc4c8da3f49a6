//! Environment lookup with an optional per-user `.env` file.
//!
//! The process environment is snapshotted once and the config file is merged
//! into that snapshot; the real process environment is never modified.

use directories::BaseDirs;
use snafu::{ensure, ResultExt, Snafu};
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

const APP_DIR: &str = "video-agent-skills";
const ENV_FILE: &str = ".env";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("cannot access env file '{}'", path.display()))]
    Access {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("env path is a directory: {}", path.display()))]
    EnvPathIsDirectory { path: PathBuf },

    #[snafu(display("cannot read env file '{}'", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `$HOME/.config/video-agent-skills/.env`, or `None` when there is no home directory.
pub fn default_env_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".config")
            .join(APP_DIR)
            .join(ENV_FILE)
    })
}

/// A snapshot of environment variables used for credential lookup.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit pairs; later pairs win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Trimmed value of `key`; unset and blank values are both `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Set `key` unless it already holds a non-empty value. Returns whether it was set.
    pub fn set_if_unset(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.vars.get(&key).is_some_and(|v| !v.is_empty()) {
            return false;
        }
        self.vars.insert(key, value.into());
        true
    }

    /// Merge `KEY=value` entries from `path` without overriding variables that are set.
    ///
    /// Values are taken literally: no variable expansion and no escape sequences.
    /// A missing file is not an error and merges nothing. Lines without `=` or
    /// without a key are skipped. Returns the number of variables that were added.
    pub fn merge_env_file(&mut self, path: &Path) -> Result<usize, Error> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no env file");
                return Ok(0);
            }
            Err(e) => return Err(e).context(AccessSnafu { path }),
        };
        ensure!(!metadata.is_dir(), EnvPathIsDirectorySnafu { path });

        let contents = std::fs::read_to_string(path).context(ReadSnafu { path })?;
        let mut added = 0;
        for (index, line) in contents.lines().enumerate() {
            match parse_line(line) {
                Line::Entry(key, value) => {
                    if self.set_if_unset(key, value) {
                        added += 1;
                    }
                }
                Line::Blank => {}
                Line::Malformed => {
                    warn!(path = %path.display(), line = index + 1, "skipping env file line")
                }
            }
        }
        debug!(path = %path.display(), added, "merged env file");
        Ok(added)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Entry(&'a str, &'a str),
    Malformed,
}

/// Split one `[export ]KEY=value` line.
fn parse_line(line: &str) -> Line<'_> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Line::Blank;
    }
    let line = line.strip_prefix("export ").map_or(line, str::trim_start);
    let Some((key, value)) = line.split_once('=') else {
        return Line::Malformed;
    };
    let key = key.trim();
    if key.is_empty() {
        return Line::Malformed;
    }
    Line::Entry(key, unquote(value.trim()))
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| {
            value
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        })
        .unwrap_or(value)
}
