//! Transports that turn a [`Request`] into a [`Response`].

use std::thread;
use std::time::Duration;

use rand::Rng;
use reqwest::blocking::{multipart as form, Client};
use reqwest::Method;
use tracing::{debug, warn};

use super::error::TransportError;
use super::request::{Part, Payload, Request};
use super::response::Response;
use crate::config::HttpConfig;

/// Sends one request and buffers the whole response.
pub trait Wire {
    fn send(&self, request: &Request) -> Result<Response, TransportError>;
}

impl<W: Wire + ?Sized> Wire for &W {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}

impl<W: Wire + ?Sized> Wire for Box<W> {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}

/// Blocking reqwest transport. Redirects are returned, not followed.
#[derive(Debug, Clone)]
pub struct ReqwestWire {
    client: Client,
}

impl ReqwestWire {
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("rexsl/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.connect_timeout(timeout).timeout(timeout);
        }
        let client = builder.build().map_err(|e| TransportError::Invalid {
            method: String::new(),
            uri: String::new(),
            message: format!("failed to create HTTP client: {e}"),
        })?;
        Ok(Self { client })
    }
}

impl Wire for ReqwestWire {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let invalid = |message: String| TransportError::Invalid {
            method: request.method().to_string(),
            uri: request.uri().to_string(),
            message,
        };
        let io = |message: String| TransportError::Io {
            method: request.method().to_string(),
            uri: request.uri().to_string(),
            message,
        };

        let method = Method::from_bytes(request.method().as_bytes())
            .map_err(|e| invalid(e.to_string()))?;
        let url = request.url().map_err(|e| invalid(e.to_string()))?;
        let mut builder = self.client.request(method, url);
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }
        match request.payload() {
            Some(Payload::Multipart(parts)) => {
                builder = builder.multipart(multipart(parts).map_err(|e| invalid(e.to_string()))?);
            }
            Some(payload) => {
                if let Some(bytes) = payload.encoded() {
                    builder = builder.body(bytes);
                }
            }
            None => {}
        }

        let response = builder.send().map_err(|e| {
            if e.is_builder() {
                invalid(e.to_string())
            } else {
                io(e.to_string())
            }
        })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let uri = response.url().to_string();
        let body = response.bytes().map_err(|e| io(e.to_string()))?;
        debug!(
            method = request.method(),
            uri = %uri,
            status = status.as_u16(),
            bytes = body.len(),
            "fetched"
        );
        Ok(Response::new(
            uri,
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
            headers,
            body.to_vec(),
        ))
    }
}

/// Fresh multipart form for one send; reqwest forms are consumed.
fn multipart(parts: &[Part]) -> reqwest::Result<form::Form> {
    let mut multipart = form::Form::new();
    for part in parts {
        let mut field = form::Part::bytes(part.data.clone());
        if let Some(file_name) = &part.file_name {
            field = field.file_name(file_name.clone());
        }
        if let Some(content_type) = &part.content_type {
            field = field.mime_str(content_type)?;
        }
        multipart = multipart.part(part.name.clone(), field);
    }
    Ok(multipart)
}

/// Re-sends a request that failed with an I/O error.
///
/// Makes up to `attempts` tries with a random pause of at most `delay`
/// between them. Responses, whatever their status, are returned as is.
#[derive(Debug, Clone)]
pub struct RetryWire<W> {
    origin: W,
    attempts: u32,
    delay: Duration,
}

impl<W: Wire> RetryWire<W> {
    pub fn new(origin: W, attempts: u32, delay: Duration) -> Self {
        Self {
            origin,
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn from_config(origin: W, config: &HttpConfig) -> Self {
        Self::new(origin, config.transport_attempts, config.retry_delay())
    }

    pub fn origin(&self) -> &W {
        &self.origin
    }
}

impl<W: Wire> Wire for RetryWire<W> {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let mut attempt = 1;
        loop {
            match self.origin.send(request) {
                Ok(response) => return Ok(response),
                Err(e) if e.is_io() && attempt < self.attempts => {
                    warn!(
                        attempt,
                        attempts = self.attempts,
                        "{e}, retrying"
                    );
                    attempt += 1;
                    thread::sleep(random_delay(self.delay));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn random_delay(max: Duration) -> Duration {
    let millis = max.as_millis() as u64;
    if millis == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
}
