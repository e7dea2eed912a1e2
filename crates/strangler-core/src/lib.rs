//! Strangler Gateway Core
//!
//! Shared vocabulary for the gateway crates:
//! - Upstream identifiers and migration targets
//! - Core error type

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{TargetService, Upstream};
