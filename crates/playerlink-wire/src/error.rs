/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The `name` field is present but is not a string.
    #[error("envelope name is not a string")]
    InvalidName,

    /// The `params` field is present but is not an object.
    #[error("envelope params for '{name}' is not an object")]
    InvalidParams { name: String },

    /// The configured namespace is unusable.
    #[error("invalid namespace '{0}'")]
    InvalidNamespace(String),

    /// An unknown event name was given where a known one was required.
    #[error("unknown event '{0}'")]
    UnknownEvent(String),
}

pub type Result<T> = std::result::Result<T, WireError>;
