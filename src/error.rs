use thiserror::Error;

/// Fatal configuration errors. Raised while parsing trigger arguments,
/// before any row is touched; the whole cycle aborts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required argument `{0}`")]
    Missing(String),

    #[error("invalid value `{value}` for `{key}`: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Per-row timestamp parse failures. Recoverable: the row is skipped with
/// a logged warning and the batch continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("timestamp has unsupported type: {0}")]
    TypeMismatch(String),

    #[error("unparseable timestamp `{0}`")]
    Format(String),
}

/// Failures from the host's query/write surface.
///
/// `NotFound` is a normal condition (a table that does not exist yet means
/// "no prior state"), kept distinct so genuine upstream failures are never
/// masked as empty state.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("not found")]
    NotFound,

    #[error("upstream unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error for a processing cycle.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Host(#[from] HostError),
}

pub type Result<T> = std::result::Result<T, Error>;
