use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// `is_registry` is true for both `Registry` and `NotFound`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("transport error: {message}")]
    Transport { message: String, timed_out: bool },

    #[error("registry returned status {status}: {message}")]
    Registry {
        status: u16,
        error_code: Option<i64>,
        message: String,
    },

    #[error("not found (status {status}): {message}")]
    NotFound {
        status: u16,
        error_code: Option<i64>,
        message: String,
    },

    #[error("malformed registry response: {0}")]
    Protocol(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub fn is_registry(&self) -> bool {
        matches!(self, Error::Registry { .. } | Error::NotFound { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// HTTP status of a registry error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Registry { status, .. } | Error::NotFound { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<i64> {
        match self {
            Error::Registry { error_code, .. } | Error::NotFound { error_code, .. } => *error_code,
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Registry { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn config<S: Into<String>>(message: S) -> Self {
        Error::Configuration(message.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport {
            timed_out: e.is_timeout(),
            message: e.to_string(),
        }
    }
}
