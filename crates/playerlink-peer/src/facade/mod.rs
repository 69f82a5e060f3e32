//! Typed views over a ready peer's pages, layers and components.
//!
//! Facade objects are cheap snapshot views. Commands go out through the
//! peer's [`Messenger`]; subscriptions go into the host's router, held
//! weakly so a dropped host does not leak through a retained facade.

mod component;
mod experience;
mod layer;
mod page;

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use playerlink_wire::{EventKind, Params, SharingType};

use crate::messenger::Messenger;
use crate::router::{Event, SubscriptionId, WeakRouter};

pub use component::{Component, ComponentCollection};
pub use experience::Experience;
pub use layer::{Layer, LayerCollection};
pub use page::{Page, PageCollection, PageState};

/// What a subscription callback receives.
#[derive(Debug, Clone)]
pub enum Notification {
    /// Page events carry the page the experience is now on.
    Page(Page),
    /// Component events carry the component they concern.
    Component(Component),
    /// `social.share`, with the network when the player named a known one.
    Share {
        component: Component,
        sharing: Option<SharingType>,
    },
    /// Layer events carry the layer they concern.
    Layer(Layer),
}

impl Notification {
    /// The component, for component and share notifications.
    pub fn component(&self) -> Option<&Component> {
        match self {
            Notification::Component(component) | Notification::Share { component, .. } => {
                Some(component)
            }
            _ => None,
        }
    }
}

/// Peer identity and channels shared by every facade object of one peer.
#[derive(Clone)]
pub(crate) struct Scope {
    peer_id: Rc<str>,
    messenger: Messenger,
    router: WeakRouter,
}

impl Scope {
    pub(crate) fn new(peer_id: &str, messenger: Messenger, router: WeakRouter) -> Self {
        Self {
            peer_id: Rc::from(peer_id),
            messenger,
            router,
        }
    }

    pub(crate) fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub(crate) fn send(&self, command: &str, params: Params) {
        self.messenger.send(command, params);
    }

    pub(crate) fn on_peer(
        &self,
        kind: EventKind,
        handler: impl Fn(&Event) + 'static,
    ) -> Option<SubscriptionId> {
        let Some(router) = self.router.upgrade() else {
            tracing::warn!(
                peer_id = %self.peer_id,
                event = %kind,
                "host is gone, subscription ignored"
            );
            return None;
        };
        router.register_for_peer(&self.peer_id, kind.as_str(), handler)
    }

    pub(crate) fn on_object(
        &self,
        object_id: &str,
        kind: EventKind,
        handler: impl Fn(&Event) + 'static,
    ) -> Option<SubscriptionId> {
        let Some(router) = self.router.upgrade() else {
            tracing::warn!(
                peer_id = %self.peer_id,
                event = %kind,
                "host is gone, subscription ignored"
            );
            return None;
        };
        router.register_for_object(&self.peer_id, object_id, kind.as_str(), handler)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("peer_id", &self.peer_id)
            .field("frame", &self.messenger.target())
            .finish()
    }
}

/// Single-entry params object.
pub(crate) fn param(key: &str, value: impl Into<Value>) -> Params {
    let mut params = Params::new();
    params.insert(key.to_string(), value.into());
    params
}

pub(crate) fn unsupported(entity: &str, kind: EventKind) -> Option<SubscriptionId> {
    tracing::warn!(entity, event = %kind, "event is not supported here, subscription ignored");
    None
}
