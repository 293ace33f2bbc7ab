//! Error types for calculation, preview and configuration

use std::path::PathBuf;

use crate::models::ExtractorKind;

/// Errors raised by the rate calculator and the resource-well aggregator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Kind name that is unknown, or missing from the loaded game data
    #[error("unsupported kind: {0}")]
    UnsupportedKind(String),
}

/// Invalid inputs, rejected instead of clamped
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("count must be at least 1")]
    ZeroCount,

    #[error("clock speed {0}% is outside 0-250%")]
    ClockSpeed(f64),

    #[error("{field} must be a non-negative number, got {value}")]
    NegativeValue { field: &'static str, value: f64 },

    #[error("at most {max} somersloops fit, got {used}")]
    Somersloop { used: u32, max: u32 },

    #[error("purity is required for {0}")]
    MissingPurity(ExtractorKind),

    #[error("unknown purity '{0}'")]
    UnknownPurity(String),

    #[error("unknown resource class '{0}'")]
    UnknownResourceClass(String),

    #[error("malformed extractor entry '{0}', expected purity[:count]")]
    MalformedEntry(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("a resource well holds at most {max} extractor nodes, got {count}")]
    TooManyNodes { count: u64, max: u32 },
}

pub type CalcResult<T> = std::result::Result<T, CalcError>;

/// Failures of an authoritative backend preview; always recoverable
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreviewError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend responded with status {0}")]
    Status(u16),

    #[error("could not decode preview response: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
