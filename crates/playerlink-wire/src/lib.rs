//! Namespaced JSON envelopes for the embedded player protocol.
//!
//! Every message crossing the frame boundary is a JSON object:
//! - `name`: the protocol namespace followed by a dotted event or command name
//! - `version`: the protocol version string of the sender
//! - `params`: an open object whose shape depends on the event
//!
//! Messages whose name does not carry the namespace belong to other senders
//! on the same page and are ignored.

pub mod codec;
pub mod commands;
pub mod error;
pub mod events;
pub mod sharing;

pub use codec::{
    decode_envelope, encode_envelope, id_param, Decoded, Envelope, Params, WireConfig,
    DEFAULT_NAMESPACE, PROTOCOL_VERSION,
};
pub use error::{Result, WireError};
pub use events::{
    is_known_event, EventKind, ANIMATION_ENDED, ANIMATION_STARTED, COMPONENT_CLICKED,
    LAYER_HIDDEN, LAYER_SHOWN, PAGE_CHANGED, PAGE_CHANGING, READY, SOCIAL_SHARE, VIDEO_PLAYED,
};
pub use sharing::SharingType;
