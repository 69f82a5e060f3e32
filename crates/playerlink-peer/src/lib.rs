//! High-level host-side management of embedded player frames.
//!
//! This is the "just works" layer. Discover which frames are expected,
//! learn when each one is ready, get a typed facade over its pages, layers
//! and components, subscribe to what happens inside it, and send commands
//! back into it.
//!
//! Everything here is single-threaded: handles are `Rc`-based and `!Send`,
//! and every inbound message is dispatched to completion before the next.

pub mod config;
pub mod deferred;
pub mod error;
pub mod facade;
pub mod host;
pub mod messenger;
pub mod router;
pub mod session;
pub mod tracker;

pub use config::HostConfig;
pub use deferred::{Deferred, DeferredState};
pub use error::{PeerError, Result};
pub use facade::{
    Component, ComponentCollection, Experience, Layer, LayerCollection, Notification, Page,
    PageCollection, PageState,
};
pub use host::Host;
pub use messenger::{Messenger, TransportSlot};
pub use router::{
    DispatchOutcome, DispatchReport, Event, EventRouter, EventSpy, Handler, SubscriptionId,
    WeakRouter,
};
pub use session::{ComponentData, ExperienceSnapshot, LayerData, PageData, PeerSession, TagGroup};
pub use tracker::{InstanceTracker, PeerDeferred, ReadyOutcome, WeakTracker};
