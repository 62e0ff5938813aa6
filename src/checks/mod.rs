//! Project checks and the registry that builds them.
//!
//! Every check implements [`Check`]. The [`CheckRegistry`] turns a list of
//! identifiers into boxed checks in execution order and hands each one the
//! configured [`Scope`].

mod binary_files;
mod check;
mod css_static;
mod files_structure;
mod in_container;
mod jigsaw_css;
mod js_static;
mod libraries;
mod registry;
mod rexsl_files;
mod web_xml;
mod xhtml_output;

pub use binary_files::{BinaryFilesCheck, TEXT_EXTENSIONS, WEBAPP_DIR};
pub use check::{Check, CheckKind, Outcome, Scope, CHECKS_MODULE, LEGACY_PACKAGE};
pub use css_static::{lint as lint_css, CssStaticCheck, CSS_DIR};
pub use files_structure::{FilesStructureCheck, REQUIRED_PATHS};
pub use in_container::{InContainerScriptsCheck, SCRIPTS_DIR};
pub use jigsaw_css::JigsawCssCheck;
pub use js_static::{lint as lint_js, JsStaticCheck, JS_DIR};
pub use libraries::{LibrariesCheck, LIB_DIR};
pub use registry::CheckRegistry;
pub use rexsl_files::{RexslFilesCheck, REXSL_DIR};
pub use web_xml::{WebXmlCheck, WEB_XML};
pub use xhtml_output::{XhtmlOutputCheck, STYLESHEET_ROOT, XHTML_DIR, XML_DIR};
