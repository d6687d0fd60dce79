use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or empty HH:MM value
    #[error("Parse error: {0}")]
    Parse(String),

    /// Process enumeration failed as a whole
    #[error("Monitor error: {0}")]
    Monitor(String),

    /// Reading or killing a single process failed
    #[error("Process error: {0}")]
    Process(String),

    #[error("Shutdown scheduler cancelled")]
    Cancelled,

    /// The platform shutdown command failed
    #[error("Shutdown error: {0}")]
    Shutdown(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Cancellation is an expected outcome, not a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
