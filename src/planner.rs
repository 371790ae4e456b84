//! Destination layout: `<base>/<Type>/<YYYY-MM-DD>/<file name>`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::file_category::Category;
use crate::grouping::Group;
use crate::reducer::GroupVerdict;

/// Where one file goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub group_key: String,
    pub source: PathBuf,
    pub destination_dir: PathBuf,
    /// Display form of the file name, lossy for non-UTF-8 names.
    pub file_name: String,
    pub resolved_type: Category,
    pub resolved_date: NaiveDate,
}

impl PlanEntry {
    /// Destination path, keeping the source's file name byte for byte.
    pub fn destination(&self) -> PathBuf {
        match self.source.file_name() {
            Some(name) => self.destination_dir.join(name),
            None => self.destination_dir.join(&self.file_name),
        }
    }
}

/// Every planned move of a run, sorted by destination then source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DestinationPlan {
    pub entries: Vec<PlanEntry>,
}

impl DestinationPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Distinct destination directories.
    pub fn directories(&self) -> BTreeSet<&Path> {
        self.entries
            .iter()
            .map(|e| e.destination_dir.as_path())
            .collect()
    }

    /// Entries bucketed by destination directory.
    pub fn by_directory(&self) -> BTreeMap<&Path, Vec<&PlanEntry>> {
        let mut buckets: BTreeMap<&Path, Vec<&PlanEntry>> = BTreeMap::new();
        for entry in &self.entries {
            buckets
                .entry(entry.destination_dir.as_path())
                .or_default()
                .push(entry);
        }
        buckets
    }

    /// Destination paths claimed by more than one source.
    pub fn collisions(&self) -> Vec<PathBuf> {
        let mut claims: HashMap<PathBuf, usize> = HashMap::new();
        for entry in &self.entries {
            *claims.entry(entry.destination()).or_insert(0) += 1;
        }
        let mut collisions: Vec<PathBuf> = claims
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(path, _)| path)
            .collect();
        collisions.sort();
        collisions
    }

    /// File count per top-level type directory.
    pub fn counts_by_type(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.resolved_type).or_insert(0) += 1;
        }
        counts
    }
}

/// Assigns every member of every group to its group's destination.
///
/// Groups without a verdict are left out. Pure: no filesystem access.
pub fn plan(
    base: &Path,
    groups: &BTreeMap<String, Group>,
    verdicts: &BTreeMap<String, GroupVerdict>,
) -> DestinationPlan {
    let mut entries = Vec::new();
    for (key, group) in groups {
        let Some(verdict) = verdicts.get(key) else {
            continue;
        };
        let destination_dir = base
            .join(verdict.resolved_type.dir_name())
            .join(verdict.resolved_date.format("%Y-%m-%d").to_string());

        for member in &group.members {
            entries.push(PlanEntry {
                group_key: key.clone(),
                source: member.source_path.clone(),
                destination_dir: destination_dir.clone(),
                file_name: member.base_name.clone(),
                resolved_type: verdict.resolved_type,
                resolved_date: verdict.resolved_date,
            });
        }
    }

    entries.sort_by(|a, b| {
        a.destination_dir
            .cmp(&b.destination_dir)
            .then_with(|| a.file_name.cmp(&b.file_name))
            .then_with(|| a.source.cmp(&b.source))
    });
    DestinationPlan { entries }
}
