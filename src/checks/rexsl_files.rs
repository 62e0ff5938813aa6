//! Layout of `src/test/rexsl`: one level of known folders, each holding
//! files of a single type.

use std::path::Path;

use super::check::{Check, CheckKind, Outcome};
use crate::config::RexslConfig;
use crate::environment::Environment;
use crate::error::Result;
use crate::fs::list_files;
use crate::utils::display_path;

/// Test resources root, relative to basedir.
pub const REXSL_DIR: &str = "src/test/rexsl";

/// Folders whose files are scripts.
const SCRIPT_FOLDERS: [&str; 4] = ["xhtml", "scripts", "setup", "bootstrap"];

#[derive(Debug, Clone)]
pub struct RexslFilesCheck {
    script_extension: String,
}

impl RexslFilesCheck {
    pub fn new(script_extension: impl Into<String>) -> Self {
        Self {
            script_extension: script_extension.into(),
        }
    }

    pub fn from_config(config: &RexslConfig) -> Self {
        Self::new(config.scripts.extension.clone())
    }

    /// Extension required for files in `folder`, if the folder is known.
    fn expected(&self, folder: &str) -> Option<&str> {
        match folder {
            "xml" => Some("xml"),
            "xsd" => Some("xsd"),
            f if SCRIPT_FOLDERS.contains(&f) => Some(&self.script_extension),
            _ => None,
        }
    }

    fn inspect(&self, dir: &Path, file: &Path, basedir: &Path) -> Option<String> {
        let shown = display_path(file, basedir);
        let relative = file.strip_prefix(dir).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let [folder, _name] = parts.as_slice() else {
            return Some(format!("File '{shown}' breaks the rexsl folder structure"));
        };
        let Some(expected) = self.expected(folder) else {
            return Some(format!("File '{shown}' is in unknown directory '{folder}'"));
        };
        let actual = file
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        if actual == expected {
            None
        } else {
            Some(format!(
                "File '{shown}' has incorrect extension (should match '{expected}')"
            ))
        }
    }
}

impl Check for RexslFilesCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::RexslFiles
    }

    fn validate(&self, env: &Environment) -> Result<Outcome> {
        let dir = env.basedir().join(REXSL_DIR);
        let diagnostics = list_files(&dir)?
            .iter()
            .filter_map(|file| self.inspect(&dir, file, env.basedir()))
            .collect();
        Ok(Outcome::from_diagnostics(diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(files: &[&str]) -> (TempDir, Environment) {
        let temp = TempDir::new().unwrap();
        for name in files {
            let path = temp.path().join(REXSL_DIR).join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        let env = Environment::builder(temp.path()).port(1).build().unwrap();
        (temp, env)
    }

    #[test]
    fn test_well_formed_layout_passes() {
        let (_temp, env) = project(&[
            "xml/index.xml",
            "xsd/page.xsd",
            "scripts/home.sh",
            "xhtml/index.sh",
            "setup/a.sh",
            "scripts/.hidden",
            ".svn/entries",
        ]);
        let outcome = RexslFilesCheck::new("sh").validate(&env).unwrap();
        assert!(outcome.passed, "{:?}", outcome.diagnostics);
    }

    #[test]
    fn test_violations_are_reported() {
        let (_temp, env) = project(&[
            "xml/index.txt",
            "scripts/deep/home.sh",
            "fixtures/data.json",
            "stray.sh",
        ]);
        let outcome = RexslFilesCheck::new("sh").validate(&env).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.diagnostics.len(), 4);
        assert!(outcome
            .diagnostics
            .contains(&"File 'src/test/rexsl/xml/index.txt' has incorrect extension (should match 'xml')".to_string()));
        assert!(outcome
            .diagnostics
            .iter()
            .any(|d| d.contains("unknown directory 'fixtures'")));
        assert!(outcome
            .diagnostics
            .iter()
            .any(|d| d.contains("scripts/deep/home.sh") && d.contains("folder structure")));
    }

    #[test]
    fn test_script_extension_comes_from_config() {
        let (_temp, env) = project(&["scripts/home.groovy"]);
        let mut config = RexslConfig::default();
        assert!(!RexslFilesCheck::from_config(&config).validate(&env).unwrap().passed);
        config.scripts.extension = "groovy".to_string();
        assert!(RexslFilesCheck::from_config(&config).validate(&env).unwrap().passed);
    }
}
