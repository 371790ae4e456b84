//! Per-file descriptors: name split, type lookup and timestamps.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::file_category::{Category, FileMapper};
use crate::metadata::{CAPTURE_DATE_MIME_TYPES, CaptureDateReader};
use crate::progress::{CancellationToken, ProgressReporter};

/// Everything the pipeline knows about one scanned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    /// File name up to its first `.`.
    pub group_key: String,
    /// Full file name as text. Non-UTF-8 bytes are replaced here; the
    /// destination takes the real name from `source_path`.
    pub base_name: String,
    /// Last dot-delimited segment, empty if the name has no dot.
    pub extension: String,
    pub source_path: PathBuf,
    pub mime_type: Option<String>,
    pub coarse_type: Option<Category>,
    pub captured_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl FileDescriptor {
    /// Capture time when known, modification time otherwise.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.captured_at.unwrap_or(self.modified_at)
    }
}

/// Splits a file name into `(group_key, extension)`.
///
/// ```
/// use phototidy::file_info::split_name;
///
/// assert_eq!(split_name("DSC0001.edited.jpg"), ("DSC0001", "jpg"));
/// assert_eq!(split_name("README"), ("README", ""));
/// ```
pub fn split_name(base_name: &str) -> (&str, &str) {
    let Some((first, _)) = base_name.split_once('.') else {
        return (base_name, "");
    };
    let extension = base_name.rsplit('.').next().unwrap_or_default();
    // A leading dot would give an empty key.
    let group_key = if first.is_empty() { base_name } else { first };
    (group_key, extension)
}

/// Builds the descriptor for one file.
///
/// # Errors
///
/// `ExtractError::Io` if the file cannot be statted or read, and
/// `ExtractError::Metadata` if a JPEG/TIFF carries a malformed container.
pub fn extract(
    path: &Path,
    mapper: &FileMapper,
    reader: &dyn CaptureDateReader,
) -> Result<FileDescriptor, ExtractError> {
    let io_error = |source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    };

    let base_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if base_name.is_empty() {
        return Err(io_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no file name",
        )));
    }

    let metadata = fs::metadata(path).map_err(io_error)?;
    let modified_at = to_utc(metadata.modified().map_err(io_error)?);
    // Birth time is missing on some filesystems.
    let created_at = metadata.created().map(to_utc).unwrap_or(modified_at);

    let (group_key, extension) = split_name(&base_name);
    let mime_type = mapper.mime_for(extension);
    let coarse_type = mime_type.as_deref().map(Category::from_mime);

    let captured_at = match mime_type.as_deref() {
        Some(mime) if CAPTURE_DATE_MIME_TYPES.contains(&mime) => {
            let bytes = fs::read(path).map_err(io_error)?;
            reader
                .capture_date(&bytes)
                .map_err(|e| ExtractError::Metadata {
                    path: path.to_path_buf(),
                    reason: e.reason,
                })?
        }
        _ => None,
    };

    debug!(
        file = %base_name,
        mime = mime_type.as_deref().unwrap_or("-"),
        captured = captured_at.is_some(),
        "extracted"
    );

    Ok(FileDescriptor {
        group_key: group_key.to_string(),
        extension: extension.to_string(),
        base_name,
        source_path: path.to_path_buf(),
        mime_type,
        coarse_type,
        captured_at,
        created_at,
        modified_at,
    })
}

/// Result of extracting a whole batch.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    /// Descriptors in scan order.
    pub descriptors: Vec<FileDescriptor>,
    pub failures: Vec<ExtractError>,
    /// Files never started because the run was cancelled.
    pub skipped: Vec<PathBuf>,
}

enum Extracted {
    Done(FileDescriptor),
    Failed(ExtractError),
    Skipped(PathBuf),
}

/// Extracts every path in parallel and waits for all of them.
///
/// Each finished file, successful or not, ticks `progress` once. Files not
/// yet started when `cancel` is raised are returned in `skipped`.
pub fn extract_all(
    paths: &[PathBuf],
    mapper: &FileMapper,
    reader: &dyn CaptureDateReader,
    progress: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> ExtractionOutcome {
    progress.start(paths.len() as u64);

    let results: Vec<Extracted> = paths
        .par_iter()
        .map(|path| {
            if cancel.is_cancelled() {
                return Extracted::Skipped(path.clone());
            }
            let result = extract(path, mapper, reader);
            progress.increment();
            match result {
                Ok(descriptor) => Extracted::Done(descriptor),
                Err(e) => {
                    warn!(error = %e, "extraction failed");
                    Extracted::Failed(e)
                }
            }
        })
        .collect();

    progress.stop();

    let mut outcome = ExtractionOutcome::default();
    for result in results {
        match result {
            Extracted::Done(descriptor) => outcome.descriptors.push(descriptor),
            Extracted::Failed(e) => outcome.failures.push(e),
            Extracted::Skipped(path) => outcome.skipped.push(path),
        }
    }
    outcome
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}
