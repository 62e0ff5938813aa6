//! Retrying test client: request, assert, and repeat while the policy
//! allows.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::error::{HttpError, TransportError};
use super::policy::AssertionPolicy;
use super::request::Request;
use super::response::Response;
use super::wire::{ReqwestWire, RetryWire, Wire};
use crate::config::HttpConfig;

pub struct RetryingHttpClient<W = RetryWire<ReqwestWire>> {
    wire: W,
    deadline: Option<Duration>,
}

impl RetryingHttpClient {
    /// Client over reqwest with transport retry, per `config`.
    pub fn from_config(config: &HttpConfig) -> Result<Self, TransportError> {
        let wire = RetryWire::from_config(ReqwestWire::new(config.timeout())?, config);
        Ok(Self::new(wire).with_deadline(config.deadline()))
    }
}

impl<W: Wire> RetryingHttpClient<W> {
    pub fn new(wire: W) -> Self {
        Self {
            wire,
            deadline: None,
        }
    }

    /// Stop retrying assertions once this much time has passed since the
    /// first attempt.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn wire(&self) -> &W {
        &self.wire
    }

    /// Send once, with transport retry only.
    pub fn fetch(&self, request: &Request) -> Result<Response, HttpError> {
        request.url()?;
        Ok(self.wire.send(request)?)
    }

    /// Send `request` until `policy` accepts the response or gives up.
    ///
    /// I/O failures go through the same `should_retry` decision as failed
    /// assertions. Invalid requests fail at once. Once the deadline has
    /// passed no further `should_retry` call is made.
    pub fn assert_with<P>(&self, request: &Request, policy: &P) -> Result<Response, HttpError>
    where
        P: AssertionPolicy + ?Sized,
    {
        request.url()?;
        let started = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            let failure = match self.wire.send(request) {
                Ok(response) => match policy.assert_on(&response) {
                    Ok(()) => {
                        debug!(attempt, uri = request.uri(), "assertion passed");
                        return Ok(response);
                    }
                    Err(failure) => HttpError::Assertion(failure),
                },
                Err(e) if e.is_io() => HttpError::Transport(e),
                Err(e) => return Err(HttpError::Transport(e)),
            };

            if let Some(deadline) = self.deadline {
                let elapsed = started.elapsed();
                if elapsed >= deadline {
                    return Err(HttpError::Deadline {
                        attempts: attempt + 1,
                        elapsed,
                        last: Box::new(failure),
                    });
                }
            }
            if !policy.should_retry(attempt) {
                return Err(failure);
            }
            attempt += 1;
            info!(
                attempt,
                method = request.method(),
                uri = request.uri(),
                "retrying after: {}",
                first_line(&failure)
            );
        }
    }
}

fn first_line(error: &HttpError) -> String {
    error.to_string().lines().next().unwrap_or_default().to_string()
}
