//! Cross-frame transport abstraction.
//!
//! Provides a unified interface over whatever one-way delivery mechanism the
//! host environment offers between isolated browsing contexts (for example
//! `window.postMessage` between a page and its embedded frames).
//!
//! This is the lowest layer of playerlink. Everything else builds on top of
//! the [`Transport`] capability and the [`FrameHandle`] addresses defined here.

pub mod error;
pub mod recording;
pub mod traits;

pub use error::{Result, TransportError};
pub use recording::{PostedMessage, RecordingTransport};
pub use traits::{FrameHandle, InboundMessage, Transport, ANY_ORIGIN};
