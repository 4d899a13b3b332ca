//!
//! src/errors.rs  Andrew Belles  Oct 2nd, 2025
//!
//! Defines enums and methods of error conversion for the
//! errors the pipeline uses, plus the per-invocation stage
//! markers
//!
//!

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("write error: {0}")]
    Write(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error)
}

impl PipelineError {
    /// Coarse kind carried by the terminal failed event. Auth,
    /// rate limit, and transport all surface as the api kind
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Config(_)         => "config",
            PipelineError::Auth(_)           => "api",
            PipelineError::RateLimited(_)    => "api",
            PipelineError::Http(_)           => "api",
            PipelineError::MalformedInput(_) => "malformed_input",
            PipelineError::Write(_)          => "write",
            PipelineError::NotFound(_)       => "not_found",
            PipelineError::Io(_)             => "io"
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self { PipelineError::Http(e.to_string()) }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self { PipelineError::MalformedInput(e.to_string()) }
}

impl From<csv::Error> for PipelineError {
    fn from(e: csv::Error) -> Self { PipelineError::Write(e.to_string()) }
}

///
/// Lifecycle of one invocation. An extract run moves through
/// Received and Extracted; a transform run through Received,
/// Normalized, and Written. Failure from any point keeps the
/// last stage reached
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Extracted,
    Normalized,
    Written,
    Done
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received   => "received",
            Stage::Extracted  => "extracted",
            Stage::Normalized => "normalized",
            Stage::Written    => "written",
            Stage::Done       => "done"
        }
    }
}
