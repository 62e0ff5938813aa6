//! The `Check` trait and the types every check shares.

use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::warn;

use crate::environment::Environment;
use crate::error::Result;

/// Module path used in fully-qualified check identifiers.
pub const CHECKS_MODULE: &str = "rexsl::checks";

/// Dotted package accepted for identifiers written for the Maven plugin.
pub const LEGACY_PACKAGE: &str = "com.rexsl.maven.checks";

/// One unit of project validation.
///
/// Checks read the [`Environment`] and never change it. Finding defects is
/// not an error: it comes back as a failed [`Outcome`]. `Err` is reserved
/// for problems that make the whole run meaningless.
pub trait Check {
    fn kind(&self) -> CheckKind;

    /// Restrict the check to matching files or scripts. Checks that have
    /// nothing to filter ignore it.
    fn set_scope(&mut self, _scope: &Scope) {}

    fn validate(&self, env: &Environment) -> Result<Outcome>;
}

/// The closed set of checks, in default execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckKind {
    BinaryFiles,
    CssStatic,
    JigsawCss,
    JsStatic,
    FilesStructure,
    RexslFiles,
    Libraries,
    XhtmlOutput,
    InContainerScripts,
    WebXml,
}

impl CheckKind {
    pub const ALL: [CheckKind; 10] = [
        CheckKind::BinaryFiles,
        CheckKind::CssStatic,
        CheckKind::JigsawCss,
        CheckKind::JsStatic,
        CheckKind::FilesStructure,
        CheckKind::RexslFiles,
        CheckKind::Libraries,
        CheckKind::XhtmlOutput,
        CheckKind::InContainerScripts,
        CheckKind::WebXml,
    ];

    /// Short identifier, e.g. `LibrariesCheck`.
    pub fn name(self) -> &'static str {
        match self {
            CheckKind::BinaryFiles => "BinaryFilesCheck",
            CheckKind::CssStatic => "CssStaticCheck",
            CheckKind::JigsawCss => "JigsawCssCheck",
            CheckKind::JsStatic => "JsStaticCheck",
            CheckKind::FilesStructure => "FilesStructureCheck",
            CheckKind::RexslFiles => "RexslFilesCheck",
            CheckKind::Libraries => "LibrariesCheck",
            CheckKind::XhtmlOutput => "XhtmlOutputCheck",
            CheckKind::InContainerScripts => "InContainerScriptsCheck",
            CheckKind::WebXml => "WebXmlCheck",
        }
    }

    /// Fully-qualified identifier, e.g. `rexsl::checks::LibrariesCheck`.
    pub fn qualified_name(self) -> String {
        format!("{CHECKS_MODULE}::{}", self.name())
    }

    /// Resolve a short or fully-qualified identifier.
    ///
    /// Short names compare case-insensitively, so `JSStaticCheck` works.
    pub fn from_name(name: &str) -> Option<CheckKind> {
        let name = name.trim();
        let short = name
            .strip_prefix(CHECKS_MODULE)
            .and_then(|rest| rest.strip_prefix("::"))
            .or_else(|| {
                name.strip_prefix(LEGACY_PACKAGE)
                    .and_then(|rest| rest.strip_prefix('.'))
            })
            .unwrap_or(name);
        if short.contains("::") || short.contains('.') {
            return None;
        }
        CheckKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(short))
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for CheckKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Which files or scripts a check looks at.
///
/// A name is in scope when it contains the expression or fully matches it
/// as a regex. The empty expression matches everything.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    expr: String,
    regex: Option<Regex>,
}

impl Scope {
    pub fn new(expr: impl Into<String>) -> Self {
        let expr = expr.into();
        let regex = if expr.is_empty() {
            None
        } else {
            match Regex::new(&format!("^(?:{expr})$")) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(scope = %expr, "scope is not a valid regex, matching by substring: {e}");
                    None
                }
            }
        };
        Self { expr, regex }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    pub fn matches(&self, name: &str) -> bool {
        name.contains(&self.expr) || self.regex.as_ref().is_some_and(|re| re.is_match(name))
    }
}

/// What a check found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub passed: bool,
    /// Defects that made the check fail.
    pub diagnostics: Vec<String>,
    /// Informational lines that do not affect the verdict.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Outcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            ..Self::default()
        }
    }

    /// Passed iff `diagnostics` is empty.
    pub fn from_diagnostics(diagnostics: Vec<String>) -> Self {
        Self {
            passed: diagnostics.is_empty(),
            diagnostics,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}
