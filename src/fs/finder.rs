//! Recursive lookup of files with a given extension.

use glob::{glob, Pattern};
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};

use crate::error::{Result, RexslError};

/// Finds every file with `extension` below `directory`, recursively.
///
/// A missing directory yields no files.
#[derive(Debug, Clone)]
pub struct FileFinder {
    directory: PathBuf,
    extension: String,
}

impl FileFinder {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Files in lexicographic path order.
    pub fn ordered(&self) -> Result<Vec<PathBuf>> {
        let mut files = self.fetch()?;
        files.sort();
        Ok(files)
    }

    /// Files in a freshly shuffled order on every call.
    pub fn random(&self) -> Result<Vec<PathBuf>> {
        let mut files = self.fetch()?;
        files.shuffle(&mut rand::thread_rng());
        Ok(files)
    }

    fn fetch(&self) -> Result<Vec<PathBuf>> {
        if !self.directory.is_dir() {
            return Ok(Vec::new());
        }
        let root = Pattern::escape(&self.directory.to_string_lossy());
        let pattern = format!("{root}/**/*.{}", Pattern::escape(&self.extension));
        let entries = glob(&pattern).map_err(|e| RexslError::Config {
            path: self.directory.clone(),
            message: format!("invalid file pattern '{pattern}': {e}"),
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                let context = format!("Failed to list {}", e.path().display());
                RexslError::io(context, e.into_error())
            })?;
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Every regular file below `dir`, sorted, skipping hidden entries and
/// `.svn` directories. A missing directory yields nothing.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if dir.is_dir() {
        collect_files(dir, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| RexslError::io(format!("Failed to read directory {}", dir.display()), e))?;
    for entry in entries {
        let entry = entry
            .map_err(|e| RexslError::io(format!("Failed to read directory {}", dir.display()), e))?;
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

/// Dot-files and version-control folders are not project content.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with('.'))
}
