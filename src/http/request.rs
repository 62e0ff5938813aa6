//! Immutable description of an HTTP request.

use reqwest::Url;
use url::form_urlencoded;

use super::error::HttpError;

pub const GET: &str = "GET";
pub const POST: &str = "POST";
pub const PUT: &str = "PUT";
pub const DELETE: &str = "DELETE";
pub const HEAD: &str = "HEAD";

/// One field of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: value.into().into_bytes(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data: data.into(),
        }
    }
}

/// Body of a request, in the shape the transport has to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    Bytes(&'a [u8]),
    Form(&'a [(String, String)]),
    Multipart(&'a [Part]),
}

impl Payload<'_> {
    /// Bytes of a raw or urlencoded body; `None` for multipart, whose
    /// boundary is chosen by the transport.
    pub fn encoded(&self) -> Option<Vec<u8>> {
        match self {
            Payload::Bytes(bytes) => Some(bytes.to_vec()),
            Payload::Form(pairs) => Some(form_urlencode(pairs).into_bytes()),
            Payload::Multipart(_) => None,
        }
    }
}

/// A request that can be sent any number of times.
///
/// Builder methods consume and return the request, so a value handed to
/// the client is never modified between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    uri: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    parts: Vec<Part>,
    cookies: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: &str, uri: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            uri: uri.into(),
            headers: Vec::new(),
            query: Vec::new(),
            form: Vec::new(),
            parts: Vec::new(),
            cookies: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(GET, uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(POST, uri)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.headers.push((name.into(), value.to_string()));
        self
    }

    pub fn query_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Add a form field; a non-empty form replaces any raw body.
    pub fn form_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.form.push((name.into(), value.to_string()));
        self
    }

    /// Add a multipart field; any parts replace both form and raw body.
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.cookies.push((name.into(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Headers as sent: explicit ones, then `Cookie` and form content type
    /// when needed.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = self.headers.clone();
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            headers.push(("Cookie".to_string(), cookie));
        }
        let has_content_type = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
        if self.parts.is_empty() && !self.form.is_empty() && !has_content_type {
            headers.push((
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ));
        }
        headers
    }

    /// Body as sent: multipart parts, else the form, else the raw body.
    pub fn payload(&self) -> Option<Payload<'_>> {
        if !self.parts.is_empty() {
            Some(Payload::Multipart(&self.parts))
        } else if !self.form.is_empty() {
            Some(Payload::Form(&self.form))
        } else {
            self.body.as_deref().map(Payload::Bytes)
        }
    }

    /// Full URL with query parameters appended.
    pub fn url(&self) -> Result<Url, HttpError> {
        let mut url = Url::parse(&self.uri).map_err(|e| HttpError::InvalidUri {
            uri: self.uri.clone(),
            message: e.to_string(),
        })?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

/// `application/x-www-form-urlencoded` serialization of `pairs`.
pub fn form_urlencode(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
