//! Host-side messaging for embedded player frames.
//!
//! playerlink lets a page that embeds one or more player frames learn when
//! each frame is ready, subscribe to what happens inside it (navigation,
//! clicks, animations, sharing) and send commands back, all over a
//! namespaced one-way message protocol.
//!
//! # Crate Structure
//!
//! - [`transport`]: frame handles and the outbound `Transport` capability
//! - [`wire`]: envelope codec, event and command names
//! - [`peer`]: event router, readiness tracking and the experience facade (behind `peer` feature)
//! - [`logging`]: stderr log subscriber with a runtime-adjustable level (behind `logging` feature)

/// Re-export transport types.
pub mod transport {
    pub use playerlink_transport::*;
}

/// Re-export wire types.
pub mod wire {
    pub use playerlink_wire::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use playerlink_peer::*;
}

#[cfg(feature = "logging")]
pub mod logging;
