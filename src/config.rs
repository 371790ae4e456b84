//! Run options and scan filters.
//!
//! Options come from built-in defaults, optionally overlaid by a TOML file
//! named explicitly with `--config`, then by command-line flags. No file is
//! ever picked up implicitly and nothing is written back.
//!
//! # Configuration File Format
//!
//! ```toml
//! skip_errors = false
//! jobs = 4
//!
//! [filters]
//! ignored_names = ["Thumbs.db", "desktop.ini"]
//! patterns = ["*.tmp"]
//! regex = ["^~\\$"]
//! ```
//!
//! `.DS_Store` and names starting with `._` are always excluded, whatever the
//! file says.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Names excluded from every scan.
pub const ALWAYS_IGNORED_NAMES: &[&str] = &[".DS_Store"];

/// Name prefix of AppleDouble resource-fork files, excluded from every scan.
pub const APPLE_DOUBLE_PREFIX: &str = "._";

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Options for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Leave files whose extraction fails in place instead of aborting.
    #[serde(default)]
    pub skip_errors: bool,

    /// Worker threads for extraction and moves; `None` uses rayon's default.
    #[serde(default)]
    pub jobs: Option<usize>,

    #[serde(default)]
    pub filters: FilterRules,
}

/// Extra exclusions on top of the built-in ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Exact file names to skip.
    #[serde(default)]
    pub ignored_names: Vec<String>,

    /// Glob patterns matched against the file name.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl OrganizerConfig {
    /// Loads options from `config_path`, or returns the defaults when no
    /// path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file is missing, unreadable
    /// or not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compiles the filter rules for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Pre-compiled scan filters.
#[derive(Debug)]
pub struct CompiledFilters {
    ignored_names: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let ignored_names = ALWAYS_IGNORED_NAMES
            .iter()
            .map(|name| name.to_string())
            .chain(rules.ignored_names.iter().cloned())
            .collect();

        Ok(Self {
            ignored_names,
            patterns,
            regexes,
        })
    }

    /// Check if a file name takes part in the run.
    ///
    /// Checked in order, stopping at the first match:
    /// 1. AppleDouble prefix `._`
    /// 2. Exact ignored name
    /// 3. Glob pattern
    /// 4. Regex pattern
    pub fn should_include(&self, file_name: &str) -> bool {
        if file_name.starts_with(APPLE_DOUBLE_PREFIX) {
            return false;
        }

        if self.ignored_names.contains(file_name) {
            return false;
        }

        if self.patterns.iter().any(|p| p.matches(file_name)) {
            return false;
        }

        !self.regexes.iter().any(|r| r.is_match(file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            ignored_names: ALWAYS_IGNORED_NAMES.iter().map(|n| n.to_string()).collect(),
            patterns: Vec::new(),
            regexes: Vec::new(),
        }
    }
}
