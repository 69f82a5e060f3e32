//! In-memory transport that records every delivery.
//!
//! Used as the transport double in tests and by the CLI `replay` command,
//! where there is no real frame to post into.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::error::{Result, TransportError};
use crate::traits::{FrameHandle, Transport};

/// A payload handed to [`RecordingTransport::post`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub target: FrameHandle,
    pub payload: String,
    pub target_origin: String,
}

#[derive(Debug, Default)]
struct Inner {
    posted: Vec<PostedMessage>,
    detached: HashSet<FrameHandle>,
}

/// Records posted messages instead of delivering them.
///
/// Clones share the same log, so a test can keep one clone for inspection
/// and hand another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    inner: Rc<RefCell<Inner>>,
}

impl RecordingTransport {
    /// Create an empty recording transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a frame as detached; subsequent posts to it fail.
    pub fn detach(&self, frame: FrameHandle) {
        self.inner.borrow_mut().detached.insert(frame);
    }

    /// Snapshot of every recorded message, in posting order.
    pub fn posted(&self) -> Vec<PostedMessage> {
        self.inner.borrow().posted.clone()
    }

    /// Recorded payloads addressed to one frame, in posting order.
    pub fn posted_to(&self, frame: FrameHandle) -> Vec<String> {
        self.inner
            .borrow()
            .posted
            .iter()
            .filter(|msg| msg.target == frame)
            .map(|msg| msg.payload.clone())
            .collect()
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.inner.borrow().posted.len()
    }

    /// True when nothing has been posted yet.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().posted.is_empty()
    }

    /// Drain and return every recorded message.
    pub fn take(&self) -> Vec<PostedMessage> {
        std::mem::take(&mut self.inner.borrow_mut().posted)
    }
}

impl Transport for RecordingTransport {
    fn post(&self, target: FrameHandle, payload: &str, target_origin: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.detached.contains(&target) {
            return Err(TransportError::Detached(target));
        }
        tracing::trace!(%target, bytes = payload.len(), "recorded outbound message");
        inner.posted.push(PostedMessage {
            target,
            payload: payload.to_string(),
            target_origin: target_origin.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ANY_ORIGIN;

    #[test]
    fn records_in_order_and_shares_log_between_clones() {
        let transport = RecordingTransport::new();
        let handle = transport.clone();

        handle.post(FrameHandle::new(1), "a", ANY_ORIGIN).unwrap();
        handle.post(FrameHandle::new(2), "b", ANY_ORIGIN).unwrap();
        handle.post(FrameHandle::new(1), "c", ANY_ORIGIN).unwrap();

        assert_eq!(transport.len(), 3);
        assert_eq!(transport.posted_to(FrameHandle::new(1)), vec!["a", "c"]);
        assert_eq!(transport.posted()[1].target_origin, "*");
    }

    #[test]
    fn detached_frame_rejects_post() {
        let transport = RecordingTransport::new();
        transport.detach(FrameHandle::new(9));

        let result = transport.post(FrameHandle::new(9), "x", ANY_ORIGIN);
        assert!(matches!(result, Err(TransportError::Detached(f)) if f == FrameHandle::new(9)));
        assert!(transport.is_empty());
    }

    #[test]
    fn take_drains_log() {
        let transport = RecordingTransport::new();
        transport.post(FrameHandle::new(1), "a", ANY_ORIGIN).unwrap();
        assert_eq!(transport.take().len(), 1);
        assert!(transport.is_empty());
    }

    #[test]
    fn rc_wrapped_transport_delegates() {
        let transport = RecordingTransport::new();
        let shared: Rc<dyn Transport> = Rc::new(transport.clone());
        shared.post(FrameHandle::new(3), "z", ANY_ORIGIN).unwrap();
        assert_eq!(transport.posted_to(FrameHandle::new(3)), vec!["z"]);
    }
}
