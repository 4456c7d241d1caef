//! Error types and load report structures for the config loaders.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::record::CapacityError;
use crate::registry::RegistryError;
use crate::tokenizer::TokenError;

/// Which of the two config files an error or report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFile {
    Rules,
    Permissions,
}

impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFile::Rules => write!(f, "rules"),
            ConfigFile::Permissions => write!(f, "permissions"),
        }
    }
}

/// Errors that abort a load pass.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The config file could not be opened.
    #[error("{file} file unavailable at {}: {source}", .path.display())]
    ConfigUnavailable {
        file: ConfigFile,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading from an opened config file failed.
    #[error("failed reading {file} file {}: {source}", .path.display())]
    Read {
        file: ConfigFile,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The registry could not store a record.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl LoadError {
    /// The file the error is about, if any.
    pub fn file(&self) -> Option<ConfigFile> {
        match self {
            LoadError::ConfigUnavailable { file, .. } | LoadError::Read { file, .. } => Some(*file),
            LoadError::Registry(_) => None,
        }
    }
}

/// Result alias for load operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Why a single line was rejected. The line is skipped; loading continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("unknown rule keyword '{0}'")]
    UnknownKeyword(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error(transparent)]
    FieldTooLong(#[from] CapacityError),

    #[error("line is {len} bytes, limit is {max}")]
    LineTooLong { len: usize, max: usize },

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// Outcome of one non-blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResult {
    /// 1-based line number.
    pub line: usize,
    pub status: LineStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineStatus {
    /// A record was inserted or merged under `name`.
    Merged { name: String },
    /// The line carried no rule (comment).
    Skipped { reason: String },
    /// The line could not be parsed and was dropped.
    Failed { error: LineError },
}

/// Per-file summary of a load pass.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub file: ConfigFile,
    pub path: PathBuf,
    pub lines: Vec<LineResult>,
}

impl LoadReport {
    pub(crate) fn new(file: ConfigFile, path: PathBuf) -> Self {
        Self {
            file,
            path,
            lines: Vec::new(),
        }
    }

    pub fn merged(&self) -> usize {
        self.count(|s| matches!(s, LineStatus::Merged { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, LineStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, LineStatus::Failed { .. }))
    }

    /// Iterate over rejected lines with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &LineError)> {
        self.lines.iter().filter_map(|r| match &r.status {
            LineStatus::Failed { error } => Some((r.line, error)),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&LineStatus) -> bool) -> usize {
        self.lines.iter().filter(|r| pred(&r.status)).count()
    }
}
