use playerlink_transport::TransportError;
use playerlink_wire::WireError;

/// Errors that can occur in host-side peer operations.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// The requested peer never announced itself from a tracked frame.
    #[error("experience \"{0}\" not found")]
    NotFound(String),

    /// A `ready` announcement carried a snapshot that could not be read.
    #[error("invalid ready snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    /// Envelope encoding/decoding error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl PeerError {
    /// The peer id this error is about, if any.
    pub fn peer_id(&self) -> Option<&str> {
        match self {
            PeerError::NotFound(id) => Some(id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PeerError>;
