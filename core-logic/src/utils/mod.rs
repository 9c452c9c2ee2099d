//! # Utilities Module
//!
//! Internal utility modules for the core-logic crate.
//! These modules are marked as `pub(crate)` to enforce API boundaries.

pub(crate) mod classify;
pub(crate) mod logger;

pub use classify::{classify_failure, truncate_message};
pub use logger::{setup_logger, RESULT_TARGET};
