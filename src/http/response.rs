//! Fully buffered HTTP response with assertion helpers.

use std::fmt;

use regex::Regex;
use reqwest::Url;
use serde::de::DeserializeOwned;
use sxd_document::parser;
use sxd_xpath::{Context, Factory, Value};

use super::error::AssertionFailure;
use super::request::Request;
use crate::utils::truncate;

/// Longest body excerpt embedded in assertion messages.
const RENDERED_BODY_CHARS: usize = 4000;

/// Namespace bound to the `xhtml` prefix in XPath queries.
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    uri: String,
    status: u16,
    reason: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    pub fn new(
        uri: impl Into<String>,
        status: u16,
        reason: impl Into<String>,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            uri: uri.into(),
            status,
            reason: reason.into(),
            headers,
            body,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// `"200 OK"`
    pub fn status_line(&self) -> String {
        format!("{} {}", self.status, self.reason)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header with that name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of a cookie set by this response.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("set-cookie"))
            .filter_map(|(_, v)| v.split(';').next())
            .filter_map(|pair| pair.split_once('='))
            .find(|(n, _)| n.trim() == name)
            .map(|(_, v)| v.trim().trim_matches('"').to_string())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Targets of `<link href>`, `<a href>` and `<img src>` in the page.
    ///
    /// Well-formed XHTML is walked as XML; anything else falls back to a
    /// lenient attribute scan.
    pub fn links(&self) -> Vec<String> {
        let text = self.text();
        match roxmltree::Document::parse(&text) {
            Ok(doc) => doc
                .descendants()
                .filter(|node| node.is_element())
                .filter_map(|node| match node.tag_name().name() {
                    "a" | "link" => node.attribute("href"),
                    "img" => node.attribute("src"),
                    _ => None,
                })
                .map(str::to_string)
                .collect(),
            Err(_) => scan_links(&text),
        }
    }

    /// Evaluate an XPath 1.0 expression against the body.
    ///
    /// Node sets yield the string value of every node in document order,
    /// strings and numbers one value, `true` one value and `false` none.
    /// The `xhtml` prefix is bound to the XHTML namespace; a DOCTYPE is
    /// ignored.
    pub fn xpath(&self, expr: &str) -> Result<Vec<String>, AssertionFailure> {
        let text = self.text();
        let package = parser::parse(&without_doctype(&text))
            .map_err(|e| self.failure(format!("body is not well-formed XML: {e:?}")))?;
        let document = package.as_document();
        let xpath = Factory::new()
            .build(expr)
            .map_err(|e| self.failure(format!("invalid XPath '{expr}': {e}")))?
            .ok_or_else(|| self.failure(format!("invalid XPath '{expr}': empty expression")))?;
        let mut context = Context::new();
        context.set_namespace("xhtml", XHTML_NS);
        let value = xpath
            .evaluate(&context, document.root())
            .map_err(|e| self.failure(format!("XPath '{expr}' failed: {e}")))?;
        Ok(match value {
            Value::Nodeset(nodes) => nodes
                .document_order()
                .iter()
                .map(|node| node.string_value())
                .collect(),
            Value::Boolean(true) => vec!["true".to_string()],
            Value::Boolean(false) => Vec::new(),
            Value::Number(number) => vec![number.to_string()],
            Value::String(string) => vec![string],
        })
    }

    /// Fails unless `expr` selects at least one node or evaluates to a
    /// true or non-empty value.
    pub fn assert_xpath(&self, expr: &str) -> Result<&Self, AssertionFailure> {
        if self.xpath(expr)?.is_empty() {
            Err(self.failure(format!("XPath '{expr}' doesn't match")))
        } else {
            Ok(self)
        }
    }

    /// GET request for the link selected by `expr`, resolved against
    /// this response's URI.
    pub fn rel(&self, expr: &str) -> Result<Request, AssertionFailure> {
        let values = self.xpath(expr)?;
        let Some(target) = values.first() else {
            return Err(self.failure(format!("XPath '{expr}' found no link")));
        };
        self.resolve(target).map(Request::get)
    }

    /// GET request for the `Location` this response points at.
    pub fn follow(&self) -> Result<Request, AssertionFailure> {
        let Some(location) = self.header("Location") else {
            return Err(self.failure("header 'Location' is absent"));
        };
        self.resolve(location).map(Request::get)
    }

    fn resolve(&self, target: &str) -> Result<String, AssertionFailure> {
        Url::parse(&self.uri)
            .and_then(|base| base.join(target.trim()))
            .map(String::from)
            .map_err(|e| self.failure(format!("can't resolve '{target}': {e}")))
    }

    pub fn assert_status(&self, status: u16) -> Result<&Self, AssertionFailure> {
        if self.status == status {
            Ok(self)
        } else {
            Err(self.failure(format!("expected status {status}, got {}", self.status)))
        }
    }

    pub fn assert_body_contains(&self, needle: &str) -> Result<&Self, AssertionFailure> {
        if self.text().contains(needle) {
            Ok(self)
        } else {
            Err(self.failure(format!("body doesn't contain '{needle}'")))
        }
    }

    pub fn assert_header(&self, name: &str, value: &str) -> Result<&Self, AssertionFailure> {
        match self.header(name) {
            Some(actual) if actual == value => Ok(self),
            Some(actual) => Err(self.failure(format!(
                "header '{name}' is '{actual}', expected '{value}'"
            ))),
            None => Err(self.failure(format!("header '{name}' is absent"))),
        }
    }

    /// Failure carrying `reason` followed by the rendered response.
    pub fn failure(&self, reason: impl fmt::Display) -> AssertionFailure {
        AssertionFailure::new(format!("{reason}\n{self}"))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HTTP/1.1 {} ({})", self.status_line(), self.uri)?;
        for (name, value) in &self.headers {
            writeln!(f, "{name}: {value}")?;
        }
        writeln!(f)?;
        write!(f, "{}", truncate(&self.text(), RENDERED_BODY_CHARS))
    }
}

fn without_doctype(text: &str) -> String {
    match Regex::new(r"(?is)<!DOCTYPE\b[^\[>]*(?:\[.*?\])?\s*>") {
        Ok(re) => re.replace(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

fn scan_links(text: &str) -> Vec<String> {
    let Ok(pattern) = Regex::new(
        r#"(?i)<(?:a|link)\b[^>]*?\bhref\s*=\s*["']([^"']*)["']|<img\b[^>]*?\bsrc\s*=\s*["']([^"']*)["']"#,
    ) else {
        return Vec::new();
    };
    pattern
        .captures_iter(text)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}
