//! # Core Logic - Shared Utilities for Testnet Diagnostics
//!
//! This crate provides shared utilities used across all chain implementations:
//! configuration and credentials, typed errors, the task trait, and logging.
//!
//! ## Modules
//!
//! - [`config`] - Chain configuration and environment credentials
//! - [`error`] - Typed error handling with thiserror
//! - [`traits`] - Core trait definitions
//! - `utils` - Logging and failure classification

pub mod config;
pub mod error;
pub mod traits;
pub(crate) mod utils;

pub use config::{ChainConfig, Credentials, RELAY_API_KEY_ENV, SIGNING_KEY_ENV};
pub use error::{ConfigError, FailureKind, NetworkError};
pub use traits::{Task, TaskResult};

pub use utils::{classify_failure, setup_logger, truncate_message, RESULT_TARGET};
