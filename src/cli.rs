//! Command-line interface module for phototidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Building the destination plan for a directory
//! - Printing the preview
//! - Running the move stage

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::OrganizerConfig;
use crate::error::{ExtractError, OrganizeError, OrganizeResult};
use crate::file_category::FileMapper;
use crate::file_info::extract_all;
use crate::file_organizer::FileOrganizer;
use crate::grouping::group_descriptors;
use crate::metadata::{CaptureDateReader, ExifReader};
use crate::output::OutputFormatter;
use crate::planner::{self, DestinationPlan};
use crate::progress::{BarReporter, CancellationToken, ProgressReporter, SilentReporter};
use crate::reducer::{GroupVerdict, reduce};
use crate::scanner::scan_directory;

/// Sort the photos, videos and sidecars of the current directory into
/// `<Type>/<YYYY-MM-DD>/` folders.
#[derive(Parser, Debug)]
#[command(name = "phototidy", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the plan as JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    /// Number of worker threads
    #[arg(short, long, global = true, value_name = "N")]
    pub jobs: Option<usize>,

    /// Extra file name to ignore (repeatable)
    #[arg(long = "ignore", value_name = "NAME", global = true)]
    pub ignore: Vec<String>,

    /// Leave unreadable files in place instead of aborting
    #[arg(long, global = true)]
    pub skip_errors: bool,

    /// Read options from this TOML file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Hide progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliCommand {
    /// Print the plan, then move the files
    Move,
}

impl Cli {
    pub fn organize_command(&self) -> OrganizeCommand {
        match self.command {
            Some(CliCommand::Move) => OrganizeCommand::Move,
            None => OrganizeCommand::Preview,
        }
    }

    /// Loads the config file, if any, and applies flag overrides.
    pub fn run_options(&self) -> OrganizeResult<RunOptions> {
        let mut config = OrganizerConfig::load(self.config.as_deref())?;
        config.skip_errors |= self.skip_errors;
        if self.jobs.is_some() {
            config.jobs = self.jobs;
        }
        config.filters.ignored_names.extend(self.ignore.iter().cloned());

        Ok(RunOptions {
            config,
            json: self.json,
            show_progress: !self.no_progress && !self.json,
            cancel: CancellationToken::new(),
        })
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Show where files would go without touching them.
    Preview,
    /// Show the plan, then move the files.
    Move,
}

/// Everything a run needs besides the directory.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: OrganizerConfig,
    pub json: bool,
    pub show_progress: bool,
    pub cancel: CancellationToken,
}

impl RunOptions {
    fn reporter(&self, message: &'static str) -> Box<dyn ProgressReporter> {
        if self.show_progress {
            Box::new(BarReporter::new(message))
        } else {
            Box::new(SilentReporter)
        }
    }
}

/// A plan plus the files that were left out of it.
#[derive(Debug)]
pub struct PlanOutcome {
    pub plan: DestinationPlan,
    /// Files whose extraction failed, only non-empty with `skip_errors`.
    pub skipped: Vec<ExtractError>,
    pub scanned: usize,
    pub groups: usize,
}

/// What a completed run did.
#[derive(Debug)]
pub struct RunSummary {
    pub plan: DestinationPlan,
    pub moved: usize,
}

/// Runs the CLI application with the given command in `dir_path`.
///
/// # Examples
///
/// ```no_run
/// use phototidy::cli::{run_cli, OrganizeCommand, RunOptions};
/// use std::path::Path;
///
/// let result = run_cli(OrganizeCommand::Preview, Path::new("/path/to/photos"), &RunOptions::default());
/// match result {
///     Ok(summary) => println!("{} file(s) planned", summary.plan.len()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(
    command: OrganizeCommand,
    dir_path: &Path,
    options: &RunOptions,
) -> OrganizeResult<RunSummary> {
    match options.config.jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(|| run_in_pool(command, dir_path, options))
        }
        None => run_in_pool(command, dir_path, options),
    }
}

fn run_in_pool(
    command: OrganizeCommand,
    dir_path: &Path,
    options: &RunOptions,
) -> OrganizeResult<RunSummary> {
    if !options.json {
        OutputFormatter::info(&format!("Organizing contents of: {}", dir_path.display()));
    }

    let extract_progress = options.reporter("reading");
    let outcome = build_plan(dir_path, options, &ExifReader, extract_progress.as_ref())?;
    OutputFormatter::skipped_files(&outcome.skipped);

    if options.json {
        OutputFormatter::print_plan_json(&outcome.plan)?;
    } else {
        OutputFormatter::info(&format!(
            "Found {} file(s) in {} group(s)",
            outcome.scanned, outcome.groups
        ));
        OutputFormatter::print_plan(&outcome.plan, dir_path);
    }

    if command == OrganizeCommand::Preview {
        if !options.json && !outcome.plan.is_empty() {
            OutputFormatter::preview_notice("No files were moved. Run 'phototidy move' to apply.");
        }
        return Ok(RunSummary {
            plan: outcome.plan,
            moved: 0,
        });
    }

    let move_progress = options.reporter("moving");
    let report = FileOrganizer::apply(&outcome.plan, move_progress.as_ref(), &options.cancel)?;
    if !options.json {
        OutputFormatter::move_report(&report);
    }
    let moved = report.into_result()?.len();

    Ok(RunSummary {
        plan: outcome.plan,
        moved,
    })
}

/// Scans `dir_path` and computes where every eligible file belongs.
///
/// Nothing on disk changes.
///
/// # Errors
///
/// - `OrganizeError::Extraction` listing every failed file, unless
///   `skip_errors` is set
/// - `OrganizeError::Cancelled` if the token was raised during extraction
/// - `OrganizeError::Collision` if two files would land on the same path
pub fn build_plan(
    dir_path: &Path,
    options: &RunOptions,
    reader: &dyn CaptureDateReader,
    progress: &dyn ProgressReporter,
) -> OrganizeResult<PlanOutcome> {
    let filters = options.config.compile_filters()?;
    let paths = scan_directory(dir_path, &filters)?;
    info!(files = paths.len(), "scanned");

    let mapper = FileMapper::default();
    let extraction = extract_all(&paths, &mapper, reader, progress, &options.cancel);

    if !extraction.skipped.is_empty() {
        return Err(OrganizeError::Cancelled);
    }
    if !extraction.failures.is_empty() && !options.config.skip_errors {
        return Err(OrganizeError::Extraction {
            failures: extraction.failures,
        });
    }

    let groups = group_descriptors(extraction.descriptors);
    let verdicts = groups
        .iter()
        .map(|(key, group)| reduce(group).map(|verdict| (key.clone(), verdict)))
        .collect::<OrganizeResult<BTreeMap<String, GroupVerdict>>>()?;
    info!(groups = groups.len(), "grouped");

    let plan = planner::plan(dir_path, &groups, &verdicts);
    let collisions = plan.collisions();
    if !collisions.is_empty() {
        return Err(OrganizeError::Collision(collisions));
    }

    Ok(PlanOutcome {
        plan,
        skipped: extraction.failures,
        scanned: paths.len(),
        groups: groups.len(),
    })
}
