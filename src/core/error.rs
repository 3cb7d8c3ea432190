//! Error types for client construction, option validation and transport calls.

/// Options rejected by validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid input argument. Options argument must be an object. Value: `{0}`.")]
    NotAnObject(String),

    #[error("invalid option. Access key must be a string. Option: `{0}`.")]
    InvalidKey(String),

    #[error("invalid option. Access secret must be a string.")]
    InvalidSecret,

    #[error("invalid option. Region option must be a string. Option: `{0}`.")]
    InvalidRegion(String),

    #[error("invalid option. Interval option must be a positive number. Option: `{0}`.")]
    InvalidInterval(String),

    #[error("invalid option. Interval option must not exceed {max_ms} milliseconds. Option: `{value}`.")]
    IntervalTooLong { value: String, max_ms: u64 },

    #[error("invalid option. Tags option must be an object array. Option: `{0}`.")]
    InvalidTags(String),

    #[error("invalid option. Each tag must have string `key` and `value` properties. Tag {index}: `{value}`.")]
    MalformedTag { index: usize, value: String },
}

/// Errors returned while building a [`Client`](crate::Client).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no Tokio runtime available; a client must be created inside a runtime")]
    NoRuntime,

    #[error("no inventory endpoint configured")]
    MissingEndpoint,

    #[error("invalid inventory endpoint `{0}`")]
    InvalidEndpoint(String),

    #[error("failed to build transport: {0}")]
    Transport(#[from] TransportError),
}

/// Failures of a single `describe_instances` call.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint error ({status_code}): {body}")]
    Status { status_code: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}
