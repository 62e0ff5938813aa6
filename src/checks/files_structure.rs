//! Required layout of a project.

use super::check::{Check, CheckKind, Outcome};
use crate::environment::Environment;
use crate::error::Result;

/// Paths every project must have, relative to basedir. A trailing slash
/// marks a directory.
pub const REQUIRED_PATHS: [&str; 7] = [
    "src/main/webapp/",
    "src/main/webapp/xsl/",
    "src/main/webapp/WEB-INF/web.xml",
    "src/test/rexsl/xml/",
    "src/test/rexsl/xhtml/",
    "src/test/rexsl/scripts/",
    "src/test/rexsl/xsd/",
];

#[derive(Debug, Clone, Default)]
pub struct FilesStructureCheck;

impl FilesStructureCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Check for FilesStructureCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::FilesStructure
    }

    fn validate(&self, env: &Environment) -> Result<Outcome> {
        let diagnostics = REQUIRED_PATHS
            .iter()
            .filter(|name| {
                let path = env.basedir().join(name.trim_end_matches('/'));
                if name.ends_with('/') {
                    !path.is_dir()
                } else {
                    !path.is_file()
                }
            })
            .map(|name| format!("File '{name}' is absent, but should be there"))
            .collect();
        Ok(Outcome::from_diagnostics(diagnostics))
    }
}
