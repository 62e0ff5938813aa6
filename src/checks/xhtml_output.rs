//! Sample XML pages, their stylesheets and the scripts that inspect them.

use std::fs;
use std::path::Path;

use regex::Regex;
use roxmltree::{Document, ParsingOptions};
use tracing::{debug, info};

use super::check::{Check, CheckKind, Outcome, Scope};
use super::css_static::in_scope;
use crate::config::RexslConfig;
use crate::environment::Environment;
use crate::error::{Result, RexslError};
use crate::fs::FileFinder;
use crate::script::{BindingBuilder, ScriptRunner, ScriptTask};
use crate::utils::display_path;

/// Sample pages, relative to basedir.
pub const XML_DIR: &str = "src/test/rexsl/xml";
/// Scripts run against sample pages, relative to basedir.
pub const XHTML_DIR: &str = "src/test/rexsl/xhtml";
/// Folder stylesheet hrefs resolve against, relative to basedir.
pub const STYLESHEET_ROOT: &str = "src/main/webapp";

#[derive(Debug, Clone)]
pub struct XhtmlOutputCheck {
    runner: ScriptRunner,
    extension: String,
    scope: Scope,
}

impl XhtmlOutputCheck {
    pub fn new(runner: ScriptRunner, extension: impl Into<String>) -> Self {
        Self {
            runner,
            extension: extension.into(),
            scope: Scope::all(),
        }
    }

    pub fn from_config(config: &RexslConfig) -> Self {
        Self::new(
            ScriptRunner::from_config(&config.scripts),
            config.scripts.extension.clone(),
        )
    }

    fn one(&self, env: &Environment, page: &Path) -> Result<Option<String>> {
        let shown = display_path(page, env.basedir());
        let xml = fs::read_to_string(page)
            .map_err(|e| RexslError::io(format!("Failed to read {}", page.display()), e))?;
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = match Document::parse_with_options(&xml, options) {
            Ok(doc) => doc,
            Err(e) => return Ok(Some(format!("File '{shown}' is not well-formed XML: {e}"))),
        };
        let Some(href) = stylesheet_href(&doc) else {
            return Ok(Some(format!("Associated XSL stylesheet not found in '{shown}'")));
        };
        let xsl = env
            .basedir()
            .join(STYLESHEET_ROOT)
            .join(href.trim_start_matches('/'));
        if !xsl.is_file() {
            return Ok(Some(format!(
                "Stylesheet '{href}' referenced by '{shown}' is absent"
            )));
        }

        let stem = page.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let script = env
            .basedir()
            .join(XHTML_DIR)
            .join(format!("{stem}.{}", self.extension));
        if !script.is_file() {
            debug!(page = %shown, "no script for page");
            return Ok(None);
        }
        let binding = BindingBuilder::new(env)
            .with_path("document", page)
            .with_path("stylesheet", &xsl)
            .build();
        info!(page = %shown, script = %display_path(&script, env.basedir()), "testing page");
        Ok(self
            .runner
            .execute(&ScriptTask::new(&script, binding))
            .err()
            .map(|failure| format!("Page '{shown}' failed its script: {failure}")))
    }
}

impl Check for XhtmlOutputCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::XhtmlOutput
    }

    fn set_scope(&mut self, scope: &Scope) {
        self.scope = scope.clone();
    }

    fn validate(&self, env: &Environment) -> Result<Outcome> {
        let pages = in_scope(&FileFinder::new(env.basedir().join(XML_DIR), "xml"), &self.scope)?;
        let mut diagnostics = Vec::new();
        for page in &pages {
            if let Some(diagnostic) = self.one(env, page)? {
                diagnostics.push(diagnostic);
            }
        }
        debug!(pages = pages.len(), "sample pages checked");
        let mut outcome = Outcome::from_diagnostics(diagnostics);
        if pages.is_empty() {
            outcome = outcome.with_note(format!("no sample pages in {XML_DIR}"));
        }
        Ok(outcome)
    }
}

/// `href` of the first `xml-stylesheet` processing instruction.
fn stylesheet_href(doc: &Document<'_>) -> Option<String> {
    let re = Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).ok()?;
    doc.root()
        .children()
        .filter_map(|node| node.pi())
        .filter(|pi| pi.target == "xml-stylesheet")
        .find_map(|pi| {
            pi.value
                .and_then(|value| re.captures(value))
                .map(|caps| caps[1].to_string())
        })
}
