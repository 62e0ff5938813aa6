//! Embedded web container used to run scripts against a live deployment.

mod core;
mod lifecycle;
mod server;


pub use core::{ContainerError, ContainerState, EmbeddedContainer};
pub use lifecycle::{PARAM_BASEDIR, PARAM_RUNTIME_FOLDERS, PARAM_XSD_FOLDER};
