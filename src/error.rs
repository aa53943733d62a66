/// Failure modes that abort a run. Numerical exhaustion during selection is
/// deliberately absent: selectors shorten their output and warn instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed input: {0}")]
    InputMalformed(String),
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
