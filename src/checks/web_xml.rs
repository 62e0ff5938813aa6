//! `WEB-INF/web.xml` must exist and describe a web application.

use std::fs;

use roxmltree::Document;

use super::check::{Check, CheckKind, Outcome};
use crate::environment::Environment;
use crate::error::{Result, RexslError};

/// Deployment descriptor, relative to basedir.
pub const WEB_XML: &str = "src/main/webapp/WEB-INF/web.xml";

#[derive(Debug, Clone, Default)]
pub struct WebXmlCheck;

impl WebXmlCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Check for WebXmlCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::WebXml
    }

    fn validate(&self, env: &Environment) -> Result<Outcome> {
        let path = env.basedir().join(WEB_XML);
        if !path.is_file() {
            return Ok(Outcome::from_diagnostics(vec![format!(
                "File '{WEB_XML}' is absent"
            )]));
        }
        let xml = fs::read_to_string(&path)
            .map_err(|e| RexslError::io(format!("Failed to read {}", path.display()), e))?;
        let diagnostic = match Document::parse(&xml) {
            Err(e) => Some(format!("File '{WEB_XML}' is not well-formed XML: {e}")),
            Ok(doc) => {
                let root = doc.root_element().tag_name().name();
                (root != "web-app")
                    .then(|| format!("File '{WEB_XML}' has root element '{root}', expected 'web-app'"))
            }
        };
        Ok(Outcome::from_diagnostics(diagnostic.into_iter().collect()))
    }
}
