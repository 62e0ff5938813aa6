//! Detection of classes packaged in more than one archive.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::error::{Result, RexslError};
use crate::fs::FileFinder;

/// A `.class` entry and the archive it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    pub name: String,
    pub archive: PathBuf,
}

/// The same class name found in two archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub class: String,
    pub first: PathBuf,
    pub second: PathBuf,
}

impl Conflict {
    /// Whether both sides are the very same archive path.
    pub fn is_repeat(&self) -> bool {
        self.first == self.second
    }
}

/// Result of scanning a set of archives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    pub archives: usize,
    pub classes: usize,
    /// Counted conflicts; the check fails when this is non-empty.
    pub conflicts: Vec<Conflict>,
    /// Same-archive repeats that were only reported.
    pub repeats: Vec<Conflict>,
}

impl ConflictReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

#[derive(Debug, Default)]
struct Scan {
    seen: HashMap<String, PathBuf>,
    report: ConflictReport,
}

/// Scans archives and keeps a running map from class entry to archive.
///
/// All accumulated state sits behind one mutex, so archives may be fed
/// from several threads; results are deterministic only for sequential
/// lexicographic feeding, which [`ConflictDetector::scan`] does.
#[derive(Debug, Default)]
pub struct ConflictDetector {
    repeated_archive_is_conflict: bool,
    scan: Mutex<Scan>,
}

impl ConflictDetector {
    pub fn new(repeated_archive_is_conflict: bool) -> Self {
        Self {
            repeated_archive_is_conflict,
            scan: Mutex::new(Scan::default()),
        }
    }

    /// Scan every archive, sorted lexicographically, and return the report.
    pub fn scan(&self, archives: &[PathBuf]) -> Result<ConflictReport> {
        let mut sorted = archives.to_vec();
        sorted.sort();
        for archive in &sorted {
            self.add_archive(archive)?;
        }
        Ok(self.report())
    }

    /// Scan every `.jar` below `dir`.
    pub fn scan_dir(&self, dir: &Path) -> Result<ConflictReport> {
        let archives = FileFinder::new(dir, "jar").ordered()?;
        if archives.is_empty() {
            info!(dir = %dir.display(), "no archives to scan");
        }
        self.scan(&archives)
    }

    /// Feed the class entries of one archive into the running map.
    pub fn add_archive(&self, archive: &Path) -> Result<()> {
        let entries = class_entries(archive)?;
        debug!(archive = %archive.display(), classes = entries.len(), "scanned archive");
        let mut scan = self.lock();
        scan.report.archives += 1;
        for entry in entries {
            self.record(&mut scan, entry);
        }
        Ok(())
    }

    /// Snapshot of everything seen so far.
    pub fn report(&self) -> ConflictReport {
        self.lock().report.clone()
    }

    fn record(&self, scan: &mut Scan, entry: ClassEntry) {
        scan.report.classes += 1;
        let Some(first) = scan.seen.get(&entry.name).cloned() else {
            scan.seen.insert(entry.name, entry.archive);
            return;
        };
        let conflict = Conflict {
            class: entry.name,
            first,
            second: entry.archive,
        };
        if conflict.is_repeat() && !self.repeated_archive_is_conflict {
            info!(
                class = %conflict.class,
                archive = %conflict.first.display(),
                "archive seen twice"
            );
            scan.report.repeats.push(conflict);
            return;
        }
        warn!(
            "{}: {} conflicts with {}",
            conflict.class,
            conflict.first.display(),
            conflict.second.display()
        );
        scan.report.conflicts.push(conflict);
    }

    fn lock(&self) -> MutexGuard<'_, Scan> {
        self.scan.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Names of `.class` file entries in an archive, directories skipped.
pub fn class_entries(archive: &Path) -> Result<Vec<ClassEntry>> {
    let file = File::open(archive)
        .map_err(|e| RexslError::io(format!("Failed to open {}", archive.display()), e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| RexslError::Archive {
        path: archive.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut entries = Vec::new();
    for index in 0..zip.len() {
        let entry = zip.by_index(index).map_err(|e| RexslError::Archive {
            path: archive.to_path_buf(),
            message: e.to_string(),
        })?;
        if entry.is_dir() || !entry.name().ends_with(".class") {
            continue;
        }
        entries.push(ClassEntry {
            name: entry.name().to_string(),
            archive: archive.to_path_buf(),
        });
    }
    Ok(entries)
}
