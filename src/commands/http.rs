//! `rexsl http`: one request with retried assertions, for shell scripts.

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::config::HttpConfig;
use crate::http::{AssertionFailure, FnPolicy, HttpError, Request, Response, RetryingHttpClient};

/// What to send and what the response must satisfy.
#[derive(Debug, Clone, Default)]
pub struct HttpArgs {
    pub method: String,
    pub url: String,
    /// `Name: value` pairs.
    pub headers: Vec<String>,
    pub body: Option<String>,
    pub status: Option<u16>,
    pub contains: Option<String>,
    pub retries: u32,
}

impl HttpArgs {
    fn request(&self) -> Result<Request> {
        let mut request = Request::new(&self.method, &self.url);
        for header in &self.headers {
            let Some((name, value)) = header.split_once(':') else {
                bail!("Header '{header}' must look like 'Name: value'");
            };
            request = request.header(name.trim(), value.trim());
        }
        if let Some(body) = &self.body {
            request = request.body(body.clone());
        }
        Ok(request)
    }

    fn assert_on(&self, response: &Response) -> Result<(), AssertionFailure> {
        if let Some(status) = self.status {
            response.assert_status(status)?;
        }
        if let Some(needle) = &self.contains {
            response.assert_body_contains(needle)?;
        }
        Ok(())
    }
}

/// Execute the http command. The body goes to stdout, failures to stderr.
pub fn execute(args: &HttpArgs, config: &HttpConfig) -> Result<bool> {
    let request = args.request()?;
    let client = RetryingHttpClient::from_config(config).context("Failed to build HTTP client")?;
    let policy = FnPolicy::new(|response: &Response| args.assert_on(response)).retries(args.retries);

    match client.assert_with(&request, &policy) {
        Ok(response) => {
            print!("{}", response.text());
            Ok(true)
        }
        Err(HttpError::InvalidUri { uri, message }) => bail!("Invalid URL '{uri}': {message}"),
        Err(e) => {
            eprintln!("{} {} {}", "✗".red().bold(), request.method(), request.uri());
            eprintln!("{e}");
            Ok(false)
        }
    }
}
