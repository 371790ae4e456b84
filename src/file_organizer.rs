/// Applies a destination plan to the filesystem.
///
/// Directory creation for the whole plan finishes before the first file is
/// moved. Files in different destination directories move in parallel; files
/// sharing a directory move one after another. A failed directory or move is
/// recorded against each affected file and the remaining files are still
/// attempted.
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{MoveError, OrganizeError, OrganizeResult};
use crate::file_category::Category;
use crate::planner::{DestinationPlan, PlanEntry};
use crate::progress::{CancellationToken, ProgressReporter};

/// A single file that was moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// The original path of the file before organization.
    pub original_path: PathBuf,
    /// The new path of the file after organization.
    pub new_path: PathBuf,
    /// The type directory the file was moved under.
    pub category: Category,
}

/// What happened to every entry of a plan.
#[derive(Debug, Default)]
pub struct MoveReport {
    pub moved: Vec<Operation>,
    /// Files that could not be moved and remain at their source path.
    pub failed: Vec<MoveError>,
    /// Files not attempted because the run was cancelled.
    pub not_attempted: Vec<PathBuf>,
}

impl MoveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.not_attempted.is_empty()
    }

    /// Converts a report with failures or skipped files into an error.
    pub fn into_result(self) -> OrganizeResult<Vec<Operation>> {
        if !self.failed.is_empty() {
            return Err(OrganizeError::MoveFailed {
                failures: self.failed,
            });
        }
        if !self.not_attempted.is_empty() {
            return Err(OrganizeError::Cancelled);
        }
        Ok(self.moved)
    }
}

enum Relocated {
    Moved(Operation),
    Failed(MoveError),
    NotAttempted(PathBuf),
}

/// Moves planned files into their type/date directories.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Creates directories and moves every file of `plan`.
    ///
    /// # Errors
    ///
    /// `OrganizeError::Collision` if two entries target the same path; nothing
    /// is touched in that case.
    ///
    /// Per-file failures, including files whose destination directory could
    /// not be created, do not produce an error here; they are listed in the
    /// returned report.
    pub fn apply(
        plan: &DestinationPlan,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> OrganizeResult<MoveReport> {
        let collisions = plan.collisions();
        if !collisions.is_empty() {
            return Err(OrganizeError::Collision(collisions));
        }

        let unavailable = Self::create_directories(plan);
        Ok(Self::relocate(plan, &unavailable, progress, cancel))
    }

    /// Creates every distinct destination directory in parallel and returns
    /// the ones that could not be created.
    ///
    /// Existing directories are left alone, so calling this twice is fine.
    pub fn create_directories(plan: &DestinationPlan) -> BTreeMap<PathBuf, io::Error> {
        let directories: Vec<&Path> = plan.directories().into_iter().collect();

        let failures: BTreeMap<PathBuf, io::Error> = directories
            .par_iter()
            .filter_map(|dir| match fs::create_dir_all(dir) {
                Ok(()) => None,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "cannot create directory");
                    Some((dir.to_path_buf(), e))
                }
            })
            .collect();

        info!(
            count = directories.len() - failures.len(),
            failed = failures.len(),
            "destination directories ready"
        );
        failures
    }

    /// Moves every planned file whose directory is available.
    ///
    /// Entries under a directory in `unavailable` are reported as failed and
    /// stay where they are.
    fn relocate(
        plan: &DestinationPlan,
        unavailable: &BTreeMap<PathBuf, io::Error>,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> MoveReport {
        progress.start(plan.len() as u64);

        let buckets: Vec<(&Path, Vec<&PlanEntry>)> = plan.by_directory().into_iter().collect();
        let results: Vec<Relocated> = buckets
            .par_iter()
            .flat_map_iter(|(dir, entries)| {
                let blocked = unavailable.get(*dir);
                entries
                    .iter()
                    .map(move |entry| {
                        if let Some(e) = blocked {
                            return Relocated::Failed(MoveError::DirectoryCreation {
                                from: entry.source.clone(),
                                path: entry.destination_dir.clone(),
                                source: io::Error::new(e.kind(), e.to_string()),
                            });
                        }
                        if cancel.is_cancelled() {
                            return Relocated::NotAttempted(entry.source.clone());
                        }
                        match Self::move_with_record(entry) {
                            Ok(operation) => {
                                progress.increment();
                                Relocated::Moved(operation)
                            }
                            Err(e) => {
                                warn!(error = %e, "move failed");
                                Relocated::Failed(e)
                            }
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        progress.stop();

        let mut report = MoveReport::default();
        for result in results {
            match result {
                Relocated::Moved(op) => report.moved.push(op),
                Relocated::Failed(e) => report.failed.push(e),
                Relocated::NotAttempted(path) => report.not_attempted.push(path),
            }
        }
        report
    }

    /// Moves one file to its planned destination and records the operation.
    ///
    /// An existing destination is never overwritten.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use phototidy::file_category::Category;
    /// use phototidy::file_organizer::FileOrganizer;
    /// use phototidy::planner::PlanEntry;
    /// use std::path::PathBuf;
    ///
    /// let entry = PlanEntry {
    ///     group_key: "IMG_0001".to_string(),
    ///     source: PathBuf::from("/photos/IMG_0001.jpg"),
    ///     destination_dir: PathBuf::from("/photos/Image/2023-04-20"),
    ///     file_name: "IMG_0001.jpg".to_string(),
    ///     resolved_type: Category::Image,
    ///     resolved_date: chrono::NaiveDate::from_ymd_opt(2023, 4, 20).unwrap(),
    /// };
    ///
    /// match FileOrganizer::move_with_record(&entry) {
    ///     Ok(op) => println!("Moved {} to {}", op.original_path.display(), op.new_path.display()),
    ///     Err(e) => eprintln!("Organization failed: {}", e),
    /// }
    /// ```
    pub fn move_with_record(entry: &PlanEntry) -> Result<Operation, MoveError> {
        let destination_path = entry.destination();

        place_without_overwrite(&entry.source, &destination_path).map_err(|source| {
            if source.kind() == io::ErrorKind::AlreadyExists {
                MoveError::DestinationExists {
                    from: entry.source.clone(),
                    to: destination_path.clone(),
                }
            } else {
                MoveError::Rename {
                    from: entry.source.clone(),
                    to: destination_path.clone(),
                    source,
                }
            }
        })?;

        debug!(from = %entry.source.display(), to = %destination_path.display(), "moved");

        Ok(Operation {
            original_path: entry.source.clone(),
            new_path: destination_path,
            category: entry.resolved_type,
        })
    }
}

/// Moves `from` to `to`, failing with `AlreadyExists` if `to` is taken.
///
/// A hard link claims the destination atomically. Filesystems without hard
/// links (FAT, exFAT, some network shares) fall back to check-then-rename,
/// which can still lose a race against a concurrent writer.
fn place_without_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => fs::remove_file(from).inspect_err(|_| {
            // Leave the file only at its source.
            let _ = fs::remove_file(to);
        }),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(e),
        Err(e) => {
            debug!(error = %e, "hard link unavailable, renaming");
            if fs::symlink_metadata(to).is_ok() {
                return Err(io::Error::from(io::ErrorKind::AlreadyExists));
            }
            fs::rename(from, to)
        }
    }
}
