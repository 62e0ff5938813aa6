//! Client of the W3C Jigsaw CSS validation service (SOAP 1.2 output).

use std::thread;
use std::time::Duration;

use regex::Regex;
use roxmltree::{Document, Node};
use tracing::{debug, warn};

use crate::http::{
    AssertionFailure, AssertionPolicy, HttpError, Part, Request, Response, RetryingHttpClient,
    Wire,
};

const CSS_VALIDATOR_NS: &str = "http://www.w3.org/2005/07/css-validator";

/// One error or warning reported by the validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defect {
    pub line: u32,
    pub column: u32,
    pub source: String,
    pub message: String,
}

impl std::fmt::Display for Defect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.line, self.message)?;
        if !self.source.is_empty() {
            write!(f, " ({})", self.source)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResponse {
    pub valid: bool,
    pub checked_by: String,
    pub errors: Vec<Defect>,
    pub warnings: Vec<Defect>,
}

impl ValidationResponse {
    fn skipped() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }
}

/// Sends stylesheets to Jigsaw and parses its verdict.
pub struct JigsawValidator<W> {
    client: RetryingHttpClient<W>,
    url: String,
    retries: u32,
    backoff: Duration,
}

impl<W: Wire> JigsawValidator<W> {
    pub fn new(client: RetryingHttpClient<W>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            retries: 3,
            backoff: Duration::from_secs(2),
        }
    }

    /// Retry budget for broken SOAP answers and the pause step between
    /// them (attempt `n` waits `n * backoff`).
    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.backoff = backoff;
        self
    }

    /// Validate one stylesheet.
    ///
    /// A file containing a `/* JIGSAW IGNORE: reason */` line is not sent.
    /// Lines of the form `/* JIGSAW: reason */` are stripped first. When
    /// the service keeps answering without a SOAP verdict the stylesheet
    /// is treated as valid; transport failures are errors.
    pub fn validate(&self, css: &str) -> Result<ValidationResponse, HttpError> {
        if ignored(css) {
            debug!("stylesheet marked JIGSAW IGNORE, not sent");
            return Ok(ValidationResponse::skipped());
        }
        let request = Request::post(&self.url)
            .header("Accept", "application/soap+xml")
            .part(Part::file("file", "file.css", "text/css", strip_markers(css)))
            .part(Part::text("output", "soap12"));
        let policy = SoapVerdict {
            retries: self.retries,
            backoff: self.backoff,
        };
        match self.client.assert_with(&request, &policy) {
            Ok(response) => Ok(parse_soap(&response.text()).unwrap_or_else(ValidationResponse::skipped)),
            Err(HttpError::Assertion(failure)) => {
                warn!("W3C validator gave no verdict, skipping: {}", first_line(&failure.message));
                Ok(ValidationResponse::skipped())
            }
            Err(e) => Err(e),
        }
    }
}

/// Accepts only a 200 carrying a `cssvalidationresponse` element.
struct SoapVerdict {
    retries: u32,
    backoff: Duration,
}

impl AssertionPolicy for SoapVerdict {
    fn assert_on(&self, response: &Response) -> Result<(), AssertionFailure> {
        if response.status() != 200 {
            return Err(response.failure("invalid HTTP status from W3C server"));
        }
        if parse_soap(&response.text()).is_none() {
            return Err(response.failure("invalid XML from W3C server"));
        }
        Ok(())
    }

    fn should_retry(&self, attempt: u32) -> bool {
        if attempt >= self.retries {
            return false;
        }
        let delay = self.backoff * (attempt + 1);
        warn!(attempt, delay_ms = delay.as_millis() as u64, "W3C response is broken, waiting");
        thread::sleep(delay);
        true
    }
}

fn ignored(css: &str) -> bool {
    Regex::new(r"(?m)^/\* JIGSAW IGNORE: [^\n]+\*/$")
        .map(|re| re.is_match(css))
        .unwrap_or(false)
}

fn strip_markers(css: &str) -> String {
    match Regex::new(r"(?m)^/\* JIGSAW: [^\n]+\*/$") {
        Ok(re) => re.replace_all(css, "").into_owned(),
        Err(_) => css.to_string(),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

/// Parse a SOAP 1.2 answer; `None` unless it holds a verdict.
pub fn parse_soap(xml: &str) -> Option<ValidationResponse> {
    let doc = Document::parse(xml).ok()?;
    let root = doc
        .descendants()
        .find(|n| is_validator(n, "cssvalidationresponse"))?;
    let valid = text_of(&root, "validity")? == "true";
    Some(ValidationResponse {
        valid,
        checked_by: text_of(&root, "checkedby").unwrap_or_default(),
        errors: defects(&root, "error"),
        warnings: defects(&root, "warning"),
    })
}

fn is_validator(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(CSS_VALIDATOR_NS)
}

fn text_of(node: &Node<'_, '_>, name: &str) -> Option<String> {
    node.descendants()
        .find(|n| is_validator(n, name))
        .map(|n| n.text().unwrap_or_default().trim().to_string())
}

fn child_text(node: &Node<'_, '_>, name: &str) -> String {
    node.children()
        .find(|n| is_validator(n, name))
        .and_then(|n| n.text())
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn defects(root: &Node<'_, '_>, name: &str) -> Vec<Defect> {
    root.descendants()
        .filter(|n| is_validator(n, name))
        .map(|n| {
            let source = child_text(&n, "source");
            Defect {
                line: child_text(&n, "line").parse().unwrap_or(0),
                column: child_text(&n, "col").parse().unwrap_or(0),
                source: if source.is_empty() {
                    child_text(&n, "context")
                } else {
                    source
                },
                message: child_text(&n, "message"),
            }
        })
        .collect()
}
