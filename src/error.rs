//! Error types for every stage of a run.
//!
//! Per-file failures (`ExtractError`, `MoveError`) are collected by their
//! stage and surfaced together through `OrganizeError`, so a user sees every
//! problem file from one run.

use std::fmt::Write as _;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to build a descriptor for one file.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The file could not be statted or read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file claims a metadata-capable type but its container is malformed.
    #[error("malformed metadata in {}: {reason}", .path.display())]
    Metadata { path: PathBuf, reason: String },
}

impl ExtractError {
    /// The file this error belongs to.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Io { path, .. } | Self::Metadata { path, .. } => path,
        }
    }
}

/// Failure to create a destination directory or relocate one file.
#[derive(Error, Debug)]
pub enum MoveError {
    /// The destination directory of `from` could not be created.
    #[error("failed to create directory {} for {}: {source}", .path.display(), .from.display())]
    DirectoryCreation {
        from: PathBuf,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to overwrite existing {} (from {})", .to.display(), .from.display())]
    DestinationExists { from: PathBuf, to: PathBuf },
}

impl MoveError {
    /// The source file left in place.
    pub fn source_path(&self) -> &PathBuf {
        match self {
            Self::DirectoryCreation { from, .. }
            | Self::Rename { from, .. }
            | Self::DestinationExists { from, .. } => from,
        }
    }
}

/// Errors that end a run.
#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("error reading directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", summarize("could not inspect", .failures))]
    Extraction { failures: Vec<ExtractError> },

    /// A group reached the reducer without members.
    #[error("internal error: group '{0}' has no members")]
    EmptyGroup(String),

    #[error("{} destination path(s) claimed by more than one file: {}", .0.len(), join_paths(.0))]
    Collision(Vec<PathBuf>),

    #[error("{}", summarize("failed to organize", .failures))]
    MoveFailed { failures: Vec<MoveError> },

    #[error("run cancelled before completion")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("failed to write plan: {0}")]
    Output(#[from] serde_json::Error),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type OrganizeResult<T> = Result<T, OrganizeError>;

fn summarize<E: std::fmt::Display>(verb: &str, failures: &[E]) -> String {
    let mut out = format!(
        "{} {} file{}:",
        verb,
        failures.len(),
        if failures.len() == 1 { "" } else { "s" }
    );
    for failure in failures {
        let _ = write!(out, "\n  - {}", failure);
    }
    out
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
