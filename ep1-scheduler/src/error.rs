use thiserror::Error;

/// Error kinds raised while parsing a trace or running a scheduler policy.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid trace line {line_no}: {detail}")]
    InvalidTrace { line_no: usize, detail: String },

    #[error("unknown scheduling policy: {0}")]
    UnknownPolicy(String),

    #[error("too many jobs: trace exceeds the configured limit of {limit}")]
    TooManyJobs { limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
