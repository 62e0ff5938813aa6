//! Only text resources may live under `src/main/webapp`.

use std::path::Path;

use tracing::debug;

use super::check::{Check, CheckKind, Outcome};
use crate::environment::Environment;
use crate::error::Result;
use crate::fs::list_files;
use crate::utils::display_path;

/// Folder scanned, relative to basedir.
pub const WEBAPP_DIR: &str = "src/main/webapp";

/// Extensions allowed in the webapp folder.
pub const TEXT_EXTENSIONS: [&str; 7] = ["html", "xml", "xhtml", "txt", "xsl", "css", "js"];

#[derive(Debug, Clone, Default)]
pub struct BinaryFilesCheck;

impl BinaryFilesCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Check for BinaryFilesCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::BinaryFiles
    }

    fn validate(&self, env: &Environment) -> Result<Outcome> {
        let dir = env.basedir().join(WEBAPP_DIR);
        let files = list_files(&dir)?;
        debug!(count = files.len(), "webapp files found");
        let diagnostics = files
            .iter()
            .filter(|file| !is_text(file))
            .map(|file| {
                format!(
                    "File {} has incorrect type/extension '{}'",
                    display_path(file, env.basedir()),
                    extension(file)
                )
            })
            .collect();
        Ok(Outcome::from_diagnostics(diagnostics))
    }
}

fn extension(file: &Path) -> String {
    file.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_text(file: &Path) -> bool {
    TEXT_EXTENSIONS.contains(&extension(file).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn env(basedir: &Path) -> Environment {
        Environment::builder(basedir).port(1).build().unwrap()
    }

    #[test]
    fn test_text_resources_pass() {
        let temp = TempDir::new().unwrap();
        let web = temp.path().join(WEBAPP_DIR);
        fs::create_dir_all(web.join("xsl")).unwrap();
        fs::write(web.join("robots.txt"), "").unwrap();
        fs::write(web.join("xsl/layout.xsl"), "<x/>").unwrap();

        let outcome = BinaryFilesCheck::new().validate(&env(temp.path())).unwrap();
        assert!(outcome.passed);
    }

    #[test]
    fn test_binary_files_are_reported() {
        let temp = TempDir::new().unwrap();
        let web = temp.path().join(WEBAPP_DIR);
        fs::create_dir_all(web.join("img")).unwrap();
        fs::write(web.join("img/logo.png"), [0x89, 0x50]).unwrap();
        fs::write(web.join("LICENSE"), "").unwrap();
        fs::write(web.join("index.html"), "").unwrap();

        let outcome = BinaryFilesCheck::new().validate(&env(temp.path())).unwrap();
        assert!(!outcome.passed);
        assert_eq!(
            outcome.diagnostics,
            vec![
                "File src/main/webapp/LICENSE has incorrect type/extension ''",
                "File src/main/webapp/img/logo.png has incorrect type/extension 'png'",
            ]
        );
    }

    #[test]
    fn test_missing_webapp_passes() {
        let temp = TempDir::new().unwrap();
        assert!(BinaryFilesCheck::new().validate(&env(temp.path())).unwrap().passed);
    }
}
