use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use playerlink_transport::{FrameHandle, Transport, ANY_ORIGIN};
use playerlink_wire::{encode_envelope, Params, WireConfig};

/// Shared, replaceable transport.
///
/// Every [`Messenger`] built by a host reads the transport from the same slot
/// at send time, so replacing it redirects existing facades as well.
#[derive(Clone)]
pub struct TransportSlot {
    current: Rc<RefCell<Rc<dyn Transport>>>,
}

impl TransportSlot {
    /// Wrap a transport.
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self {
            current: Rc::new(RefCell::new(transport)),
        }
    }

    /// Swap in a different transport.
    pub fn replace(&self, transport: Rc<dyn Transport>) {
        *self.current.borrow_mut() = transport;
    }

    /// The transport currently in the slot.
    pub fn get(&self) -> Rc<dyn Transport> {
        Rc::clone(&self.current.borrow())
    }
}

impl fmt::Debug for TransportSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSlot").finish_non_exhaustive()
    }
}

/// Sends namespaced commands into one frame.
#[derive(Clone)]
pub struct Messenger {
    target: FrameHandle,
    transport: TransportSlot,
    wire: Rc<WireConfig>,
}

impl Messenger {
    /// Create a messenger addressing `target`.
    pub fn new(target: FrameHandle, transport: TransportSlot, wire: Rc<WireConfig>) -> Self {
        Self {
            target,
            transport,
            wire,
        }
    }

    /// The frame this messenger posts into.
    pub fn target(&self) -> FrameHandle {
        self.target
    }

    /// Send `command` with `params`.
    ///
    /// Fire-and-forget: there is no confirmation, and encoding or delivery
    /// failures are logged rather than returned.
    pub fn send(&self, command: &str, params: Params) {
        let payload = match encode_envelope(command, &params, &self.wire) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(command, error = %err, "failed to encode command");
                return;
            }
        };

        tracing::debug!(target_frame = %self.target, %payload, "posting message to frame");
        let transport = self.transport.get();
        if let Err(err) = transport.post(self.target, &payload, ANY_ORIGIN) {
            tracing::warn!(
                target_frame = %self.target,
                command,
                error = %err,
                "failed to post message to frame"
            );
        }
    }
}

impl fmt::Debug for Messenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("target", &self.target)
            .field("namespace", &self.wire.namespace)
            .finish()
    }
}
