use crate::traits::FrameHandle;

/// Errors that can occur while delivering a message into a frame.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The target frame is no longer attached to the host document.
    #[error("frame {0} is detached")]
    Detached(FrameHandle),
}

pub type Result<T> = std::result::Result<T, TransportError>;
