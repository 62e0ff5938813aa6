//! HTTP test client whose assertions are retried under an explicit policy.
//!
//! ```no_run
//! use rexsl::http::{ExpectStatus, Request, RetryingHttpClient};
//! use rexsl::config::HttpConfig;
//!
//! let client = RetryingHttpClient::from_config(&HttpConfig::default())?;
//! let response = client.assert_with(
//!     &Request::get("http://localhost:8080/").header("Accept", "text/html"),
//!     &ExpectStatus::new(200).retries(2),
//! )?;
//! println!("{}", response.text());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod client;
mod error;
mod policy;
mod request;
mod response;
mod wire;

pub use client::RetryingHttpClient;
pub use error::{AssertionFailure, HttpError, TransportError};
pub use policy::{AssertionPolicy, ExpectStatus, Failure, FnPolicy, NoBrokenLinks, Retrying};
pub use request::{form_urlencode, Part, Payload, Request, DELETE, GET, HEAD, POST, PUT};
pub use response::Response;
pub use wire::{ReqwestWire, RetryWire, Wire};
