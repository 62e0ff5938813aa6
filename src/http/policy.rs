//! Assertion policies for [`RetryingHttpClient`](super::RetryingHttpClient).

use reqwest::Url;
use tracing::{debug, warn};

use super::error::AssertionFailure;
use super::request::Request;
use super::response::Response;
use super::wire::Wire;

/// What must hold for a response, and whether to try again when it doesn't.
pub trait AssertionPolicy {
    fn assert_on(&self, response: &Response) -> Result<(), AssertionFailure>;

    /// `attempt` is the number of attempts already made after the first,
    /// so it is 0 when the first request fails.
    fn should_retry(&self, attempt: u32) -> bool;
}

impl<P: AssertionPolicy + ?Sized> AssertionPolicy for &P {
    fn assert_on(&self, response: &Response) -> Result<(), AssertionFailure> {
        (**self).assert_on(response)
    }

    fn should_retry(&self, attempt: u32) -> bool {
        (**self).should_retry(attempt)
    }
}

impl<P: AssertionPolicy + ?Sized> AssertionPolicy for Box<P> {
    fn assert_on(&self, response: &Response) -> Result<(), AssertionFailure> {
        (**self).assert_on(response)
    }

    fn should_retry(&self, attempt: u32) -> bool {
        (**self).should_retry(attempt)
    }
}

/// Status must equal `status`; retried while `attempt < retries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectStatus {
    pub status: u16,
    pub retries: u32,
}

impl ExpectStatus {
    pub fn new(status: u16) -> Self {
        Self { status, retries: 0 }
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

impl AssertionPolicy for ExpectStatus {
    fn assert_on(&self, response: &Response) -> Result<(), AssertionFailure> {
        response.assert_status(self.status).map(|_| ())
    }

    fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.retries
    }
}

/// Always fails with `reason`; never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    reason: String,
}

impl Failure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl AssertionPolicy for Failure {
    fn assert_on(&self, response: &Response) -> Result<(), AssertionFailure> {
        Err(response.failure(&self.reason))
    }

    fn should_retry(&self, _attempt: u32) -> bool {
        false
    }
}

/// Wraps a policy so that it is retried up to `times` more times.
#[derive(Debug, Clone)]
pub struct Retrying<P> {
    inner: P,
    times: u32,
}

impl<P: AssertionPolicy> Retrying<P> {
    pub fn new(inner: P, times: u32) -> Self {
        Self { inner, times }
    }
}

impl<P: AssertionPolicy> AssertionPolicy for Retrying<P> {
    fn assert_on(&self, response: &Response) -> Result<(), AssertionFailure> {
        self.inner.assert_on(response)
    }

    fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.times
    }
}

/// Policy made of a closure, never retried unless `retries` is set.
pub struct FnPolicy<F> {
    check: F,
    retries: u32,
}

impl<F> FnPolicy<F>
where
    F: Fn(&Response) -> Result<(), AssertionFailure>,
{
    pub fn new(check: F) -> Self {
        Self { check, retries: 0 }
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

impl<F> AssertionPolicy for FnPolicy<F>
where
    F: Fn(&Response) -> Result<(), AssertionFailure>,
{
    fn assert_on(&self, response: &Response) -> Result<(), AssertionFailure> {
        (self.check)(response)
    }

    fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.retries
    }
}

/// Every link, stylesheet and image in the page must answer below 400.
///
/// Absolute-path links resolve against `home`. Never retried.
pub struct NoBrokenLinks<W> {
    home: Url,
    wire: W,
}

impl<W: Wire> NoBrokenLinks<W> {
    pub fn new(home: Url, wire: W) -> Self {
        Self { home, wire }
    }

    fn resolve(&self, link: &str) -> Option<Url> {
        if link.starts_with('/') {
            self.home.join(link).ok()
        } else {
            Url::parse(link).ok()
        }
    }

    fn is_valid(&self, url: &Url) -> bool {
        match self.wire.send(&Request::get(url.as_str())) {
            Ok(response) if response.status() < 400 => true,
            Ok(response) => {
                warn!(link = %url, status = response.status(), "broken link");
                false
            }
            Err(e) => {
                warn!(link = %url, "broken link: {e}");
                false
            }
        }
    }
}

impl<W: Wire> AssertionPolicy for NoBrokenLinks<W> {
    fn assert_on(&self, response: &Response) -> Result<(), AssertionFailure> {
        let links = response.links();
        debug!(count = links.len(), "links found");
        let broken: Vec<String> = links
            .iter()
            .filter(|link| match self.resolve(link) {
                Some(url) => !self.is_valid(&url),
                None => true,
            })
            .cloned()
            .collect();
        if broken.is_empty() {
            Ok(())
        } else {
            Err(response.failure(format!(
                "{} broken link(s) found: {}",
                broken.len(),
                broken.join(", ")
            )))
        }
    }

    fn should_retry(&self, _attempt: u32) -> bool {
        false
    }
}
