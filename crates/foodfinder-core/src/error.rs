use thiserror::Error;

/// Failure talking to the restaurant backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {status}")]
    Status { status: u16 },

    #[error("not signed in: {0}")]
    Unauthorized(String),

    #[error("malformed response: {0}")]
    Decode(String),

    /// The backend answered but reported an error in its body.
    #[error("{0}")]
    Backend(String),

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    InvalidInput(String),
}

/// Why a file could not be staged for upload.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("image is empty")]
    Empty,

    #[error("image is {size} bytes, max is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("could not read image: {0}")]
    Io(#[from] std::io::Error),
}
