use thiserror::Error;

/// Failure of a single call to the submissions service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiCallError {
    /// The service answered with a non-success status. `message` is the
    /// service's `error` field when it sent one.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// No response was received.
    #[error("{0}")]
    Transport(String),
    /// A success status whose body could not be read as JSON of the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiCallError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Client-side form validation failures. No request is made for these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Age must be a whole number")]
    InvalidAge,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid api base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("api base url must use http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
