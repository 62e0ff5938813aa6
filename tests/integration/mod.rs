//! Integration tests for the rexsl pipeline and its building blocks
//!
//! These tests drive real projects on disk, a real loopback container and
//! real HTTP round-trips through the retrying client.

pub mod conflicts;
pub mod container_lifecycle;
pub mod helpers;
pub mod pipeline;
pub mod retry_client;
