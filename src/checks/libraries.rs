//! No class may be packaged by two libraries of the webapp.

use std::path::Path;

use tracing::info;

use super::check::{Check, CheckKind, Outcome};
use crate::archive::ConflictDetector;
use crate::config::RexslConfig;
use crate::environment::Environment;
use crate::error::Result;

/// Library folder, relative to webdir.
pub const LIB_DIR: &str = "WEB-INF/lib";

#[derive(Debug, Clone, Default)]
pub struct LibrariesCheck {
    repeated_archive_is_conflict: bool,
}

impl LibrariesCheck {
    pub fn new(repeated_archive_is_conflict: bool) -> Self {
        Self {
            repeated_archive_is_conflict,
        }
    }

    pub fn from_config(config: &RexslConfig) -> Self {
        Self::new(config.libraries.repeated_archive_is_conflict)
    }
}

impl Check for LibrariesCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Libraries
    }

    fn validate(&self, env: &Environment) -> Result<Outcome> {
        let dir = env.webdir().join(LIB_DIR);
        let detector = ConflictDetector::new(self.repeated_archive_is_conflict);
        let report = detector.scan_dir(&dir)?;
        info!(
            archives = report.archives,
            classes = report.classes,
            conflicts = report.conflicts.len(),
            "libraries scanned"
        );
        let diagnostics = report
            .conflicts
            .iter()
            .map(|c| format!("{}: {} conflicts with {}", c.class, stem(&c.first), stem(&c.second)))
            .collect();
        let mut outcome = Outcome::from_diagnostics(diagnostics);
        for repeat in &report.repeats {
            outcome = outcome.with_note(format!(
                "{}: repeated in {}",
                repeat.class,
                stem(&repeat.first)
            ));
        }
        Ok(outcome)
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
