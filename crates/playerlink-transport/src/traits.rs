use std::fmt;

use crate::error::Result;

/// Target origin used for every outbound delivery.
///
/// Origins are never checked on send; receivers filter on the protocol
/// namespace instead.
pub const ANY_ORIGIN: &str = "*";

/// Opaque address of an embedded frame's execution context.
///
/// Handles are minted by the discovery collaborator and compared by value.
/// The numeric value carries no meaning beyond identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

impl FrameHandle {
    /// Wrap a raw handle value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

impl From<u64> for FrameHandle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// A raw message delivered to the host by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// The frame the message came from.
    pub source: FrameHandle,
    /// The undecoded wire payload.
    pub data: String,
}

impl InboundMessage {
    /// Create a new inbound message.
    pub fn new(source: FrameHandle, data: impl Into<String>) -> Self {
        Self {
            source,
            data: data.into(),
        }
    }
}

/// One-way delivery of string payloads into a frame.
///
/// Implementations must not block and must not call back into the host
/// synchronously. Delivery is fire-and-forget: a successful return only
/// means the payload was handed to the environment.
pub trait Transport {
    /// Post `payload` into `target`, addressed to `target_origin`.
    fn post(&self, target: FrameHandle, payload: &str, target_origin: &str) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for std::rc::Rc<T> {
    fn post(&self, target: FrameHandle, payload: &str, target_origin: &str) -> Result<()> {
        (**self).post(target, payload, target_origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_handle_display_and_ordering() {
        let a = FrameHandle::new(1);
        let b = FrameHandle::from(2);
        assert!(a < b);
        assert_eq!(a.to_string(), "frame#1");
        assert_eq!(b.raw(), 2);
    }

    #[test]
    fn inbound_message_keeps_payload_verbatim() {
        let msg = InboundMessage::new(FrameHandle::new(7), r#"{"name":"x"}"#);
        assert_eq!(msg.source, FrameHandle::new(7));
        assert_eq!(msg.data, r#"{"name":"x"}"#);
    }
}
