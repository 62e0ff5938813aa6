//! Builds and orders the active checks from a list of identifiers.

use regex::Regex;
use tracing::debug;

use super::binary_files::BinaryFilesCheck;
use super::check::{Check, CheckKind, Scope};
use super::css_static::CssStaticCheck;
use super::files_structure::FilesStructureCheck;
use super::in_container::InContainerScriptsCheck;
use super::jigsaw_css::JigsawCssCheck;
use super::js_static::JsStaticCheck;
use super::libraries::LibrariesCheck;
use super::rexsl_files::RexslFilesCheck;
use super::web_xml::WebXmlCheck;
use super::xhtml_output::XhtmlOutputCheck;
use crate::config::RexslConfig;
use crate::error::{Result, RexslError};

type Constructor = fn(&RexslConfig) -> Box<dyn Check>;

fn constructor(kind: CheckKind) -> Constructor {
    match kind {
        CheckKind::BinaryFiles => |_| Box::new(BinaryFilesCheck::new()),
        CheckKind::CssStatic => |_| Box::new(CssStaticCheck::new()),
        CheckKind::JigsawCss => |c| Box::new(JigsawCssCheck::from_config(c)),
        CheckKind::JsStatic => |_| Box::new(JsStaticCheck::new()),
        CheckKind::FilesStructure => |_| Box::new(FilesStructureCheck::new()),
        CheckKind::RexslFiles => |c| Box::new(RexslFilesCheck::from_config(c)),
        CheckKind::Libraries => |c| Box::new(LibrariesCheck::from_config(c)),
        CheckKind::XhtmlOutput => |c| Box::new(XhtmlOutputCheck::from_config(c)),
        CheckKind::InContainerScripts => |c| Box::new(InContainerScriptsCheck::from_config(c)),
        CheckKind::WebXml => |_| Box::new(WebXmlCheck::new()),
    }
}

/// Ordered set of check identifiers plus the scope given to every check
/// it builds.
///
/// The active list keeps insertion order and drops exact duplicates. When
/// it is empty the full default list is used.
#[derive(Debug, Clone)]
pub struct CheckRegistry {
    config: RexslConfig,
    active: Vec<String>,
    scope: Scope,
}

impl CheckRegistry {
    pub fn new(config: RexslConfig) -> Self {
        let scope = Scope::new(config.scope.clone());
        let mut registry = Self {
            active: Vec::new(),
            scope,
            config,
        };
        let names = registry.config.checks.clone();
        registry.replace(names);
        registry
    }

    /// Replace the active set with a comma-separated list of identifiers.
    /// A blank list restores the defaults.
    pub fn set_check(&mut self, names: &str) {
        let names = match Regex::new(r"\s*,\s*") {
            Ok(re) => re.split(names.trim()).map(str::to_string).collect(),
            Err(_) => names.split(',').map(|n| n.trim().to_string()).collect(),
        };
        self.replace(names);
    }

    /// Scope for checks built from now on.
    pub fn set_scope(&mut self, expr: &str) {
        self.scope = Scope::new(expr);
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn config(&self) -> &RexslConfig {
        &self.config
    }

    /// Identifiers that will run, in order.
    pub fn active(&self) -> Vec<String> {
        if self.active.is_empty() {
            default_names()
        } else {
            self.active.clone()
        }
    }

    /// Every known identifier, in default execution order.
    pub fn known() -> Vec<String> {
        default_names()
    }

    /// Build one check by short or fully-qualified identifier.
    pub fn build(&self, name: &str) -> Result<Box<dyn Check>> {
        let kind = CheckKind::from_name(name).ok_or_else(|| RexslError::UnknownCheck {
            name: name.to_string(),
            known: Self::known(),
        })?;
        let mut check = constructor(kind)(&self.config);
        check.set_scope(&self.scope);
        debug!(check = %kind, scope = %self.scope.expr(), "check built");
        Ok(check)
    }

    /// Build every active check. Identifiers naming the same check collapse
    /// to its first position.
    pub fn all(&self) -> Result<Vec<Box<dyn Check>>> {
        let mut seen = Vec::new();
        let mut checks = Vec::new();
        for name in self.active() {
            let check = self.build(&name)?;
            if seen.contains(&check.kind()) {
                continue;
            }
            seen.push(check.kind());
            checks.push(check);
        }
        Ok(checks)
    }

    fn replace(&mut self, names: Vec<String>) {
        self.active.clear();
        for name in names {
            let name = name.trim().to_string();
            if !name.is_empty() && !self.active.contains(&name) {
                self.active.push(name);
            }
        }
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new(RexslConfig::default())
    }
}

fn default_names() -> Vec<String> {
    CheckKind::ALL
        .iter()
        .map(|kind| kind.name().to_string())
        .collect()
}
