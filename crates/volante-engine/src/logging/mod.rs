//! Logging utilities.
//!
//! The engine only talks to the `log` facade. This module owns the one place
//! where a concrete backend (`env_logger`) is installed, so embedders that
//! bring their own logger can simply skip [`init_logging`].

mod init;

pub use init::{init_logging, LoggingConfig};
