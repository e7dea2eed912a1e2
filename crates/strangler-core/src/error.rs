//! Error types for Strangler Gateway Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid upstream URL for {upstream}: {message}")]
    InvalidUpstreamUrl { upstream: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
