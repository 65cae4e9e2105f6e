#![deny(unsafe_op_in_unsafe_fn)]
//! Tracing setup shared by the airbuddy binaries.

pub mod config;
pub mod fs;
pub mod init;
pub mod targets;

pub use config::LoggingConfig;
pub use fs::{config_path, read_config, write_config_atomic};
pub use init::{apply, init, LoggingGuards};
