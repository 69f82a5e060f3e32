//! Subscription registry and inbound dispatch.
//!
//! Handlers live in three tiers:
//! - global: keyed by event name only (used for `ready`, before a peer id is known)
//! - per-peer: keyed by peer id, then event name
//! - per-object: keyed by peer id, event name, then layer or component id
//!
//! One inbound event runs every matching global handler, then every matching
//! per-peer handler, then every matching per-object handler (layer before
//! component). Within a tier handlers run in registration order.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use playerlink_transport::{FrameHandle, InboundMessage};
use playerlink_wire::{decode_envelope, id_param, Decoded, Envelope, Params, WireConfig};

/// An inbound event after namespace stripping.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name without namespace.
    pub name: String,
    /// Sender protocol version.
    pub version: String,
    /// Event parameters.
    pub params: Params,
    /// Frame that sent the event.
    pub source: FrameHandle,
}

impl Event {
    /// Build an event from a decoded envelope.
    pub fn from_envelope(envelope: Envelope, source: FrameHandle) -> Self {
        Self {
            name: envelope.name,
            version: envelope.version,
            params: envelope.params,
            source,
        }
    }

    /// `params.experienceId`.
    pub fn peer_id(&self) -> Option<String> {
        id_param(&self.params, "experienceId")
    }

    /// `params.layerId`.
    pub fn layer_id(&self) -> Option<String> {
        id_param(&self.params, "layerId")
    }

    /// `params.componentId`.
    pub fn component_id(&self) -> Option<String> {
        id_param(&self.params, "componentId")
    }

    /// A string parameter.
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|value| value.as_str())
    }

    /// A positive integer parameter, accepting numeric strings.
    pub fn u32_param(&self, key: &str) -> Option<u32> {
        let value = self.params.get(key)?;
        let number = match value {
            serde_json::Value::Number(n) => n.as_u64()?,
            serde_json::Value::String(s) => s.trim().parse::<u64>().ok()?,
            _ => return None,
        };
        u32::try_from(number).ok()
    }
}

/// Callback invoked for a matching event.
pub type Handler = Rc<dyn Fn(&Event)>;

/// Token returned by every successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw token value. Tokens increase in registration order.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Handler counts for one dispatched event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub global: usize,
    pub peer: usize,
    pub object: usize,
    /// Handlers that panicked.
    pub failed: usize,
}

impl DispatchReport {
    /// Total handlers invoked.
    pub fn total(&self) -> usize {
        self.global + self.peer + self.object
    }
}

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not parseable, or protocol fields of the wrong type.
    Malformed,
    /// Not a message of our namespace.
    Foreign,
    /// Decoded and dispatched.
    Dispatched(DispatchReport),
}

/// Observes every dispatched event.
pub trait EventSpy {
    fn observe(&self, event: &Event, report: &DispatchReport);
}

impl<F: Fn(&Event, &DispatchReport)> EventSpy for F {
    fn observe(&self, event: &Event, report: &DispatchReport) {
        self(event, report)
    }
}

type Bucket = BTreeMap<SubscriptionId, Handler>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Global {
        event: String,
    },
    Peer {
        peer: String,
        event: String,
    },
    Object {
        peer: String,
        event: String,
        object: String,
    },
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    global: HashMap<String, Bucket>,
    per_peer: HashMap<String, HashMap<String, Bucket>>,
    per_object: HashMap<String, HashMap<String, HashMap<String, Bucket>>>,
    slots: HashMap<SubscriptionId, Slot>,
}

impl Registry {
    fn insert(&mut self, slot: Slot, handler: Handler) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let bucket = match &slot {
            Slot::Global { event } => self.global.entry(event.clone()).or_default(),
            Slot::Peer { peer, event } => self
                .per_peer
                .entry(peer.clone())
                .or_default()
                .entry(event.clone())
                .or_default(),
            Slot::Object {
                peer,
                event,
                object,
            } => self
                .per_object
                .entry(peer.clone())
                .or_default()
                .entry(event.clone())
                .or_default()
                .entry(object.clone())
                .or_default(),
        };
        bucket.insert(id, handler);
        self.slots.insert(id, slot);
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let Some(slot) = self.slots.remove(&id) else {
            return false;
        };
        let bucket = match &slot {
            Slot::Global { event } => self.global.get_mut(event),
            Slot::Peer { peer, event } => self
                .per_peer
                .get_mut(peer)
                .and_then(|events| events.get_mut(event)),
            Slot::Object {
                peer,
                event,
                object,
            } => self
                .per_object
                .get_mut(peer)
                .and_then(|events| events.get_mut(event))
                .and_then(|objects| objects.get_mut(object)),
        };
        bucket.is_some_and(|bucket| bucket.remove(&id).is_some())
    }

    /// Matching handlers in dispatch order, with per-tier counts.
    fn matching(&self, event: &Event) -> (Vec<Handler>, [usize; 3]) {
        let mut handlers = Vec::new();
        let mut counts = [0usize; 3];

        if let Some(bucket) = self.global.get(&event.name) {
            handlers.extend(bucket.values().cloned());
            counts[0] = bucket.len();
        }

        let Some(peer_id) = event.peer_id() else {
            return (handlers, counts);
        };

        if let Some(bucket) = self
            .per_peer
            .get(&peer_id)
            .and_then(|events| events.get(&event.name))
        {
            handlers.extend(bucket.values().cloned());
            counts[1] = bucket.len();
        }

        if let Some(objects) = self
            .per_object
            .get(&peer_id)
            .and_then(|events| events.get(&event.name))
        {
            for object_id in [event.layer_id(), event.component_id()].into_iter().flatten() {
                if let Some(bucket) = objects.get(&object_id) {
                    handlers.extend(bucket.values().cloned());
                    counts[2] += bucket.len();
                }
            }
        }

        (handlers, counts)
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

struct Shared {
    registry: RefCell<Registry>,
    spy: RefCell<Option<Rc<dyn EventSpy>>>,
    wire: Rc<WireConfig>,
}

/// Three-tier subscription registry plus the inbound decoder.
///
/// Clones share the same registry.
#[derive(Clone)]
pub struct EventRouter {
    shared: Rc<Shared>,
}

/// Non-owning router handle held by facade objects.
#[derive(Clone, Default)]
pub struct WeakRouter {
    shared: Weak<Shared>,
}

impl WeakRouter {
    /// The router, if the host that owns it is still alive.
    pub fn upgrade(&self) -> Option<EventRouter> {
        self.shared.upgrade().map(|shared| EventRouter { shared })
    }
}

impl EventRouter {
    /// Create an empty router using `wire` to decode inbound messages.
    pub fn new(wire: Rc<WireConfig>) -> Self {
        Self {
            shared: Rc::new(Shared {
                registry: RefCell::new(Registry::default()),
                spy: RefCell::new(None),
                wire,
            }),
        }
    }

    /// Non-owning handle to this router.
    pub fn downgrade(&self) -> WeakRouter {
        WeakRouter {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Wire configuration used for decoding.
    pub fn wire(&self) -> &WireConfig {
        &self.shared.wire
    }

    /// Register a handler for `event` regardless of sender.
    pub fn register_global(
        &self,
        event: &str,
        handler: impl Fn(&Event) + 'static,
    ) -> Option<SubscriptionId> {
        if event.is_empty() {
            tracing::warn!("attempt to register a global handler without an event name");
            return None;
        }
        Some(self.insert(
            Slot::Global {
                event: event.to_string(),
            },
            Rc::new(handler),
        ))
    }

    /// Register a handler for `event` raised by one peer.
    pub fn register_for_peer(
        &self,
        peer_id: &str,
        event: &str,
        handler: impl Fn(&Event) + 'static,
    ) -> Option<SubscriptionId> {
        if peer_id.is_empty() || event.is_empty() {
            tracing::warn!(
                peer_id,
                event,
                "attempt to register a peer handler without a peer id or event name"
            );
            return None;
        }
        Some(self.insert(
            Slot::Peer {
                peer: peer_id.to_string(),
                event: event.to_string(),
            },
            Rc::new(handler),
        ))
    }

    /// Register a handler for `event` raised about one layer or component.
    ///
    /// Object ids are unique across peers; the peer id only scopes the
    /// event name.
    pub fn register_for_object(
        &self,
        peer_id: &str,
        object_id: &str,
        event: &str,
        handler: impl Fn(&Event) + 'static,
    ) -> Option<SubscriptionId> {
        if peer_id.is_empty() || object_id.is_empty() || event.is_empty() {
            tracing::warn!(
                peer_id,
                object_id,
                event,
                "attempt to register an object handler without a peer id, object id or event name"
            );
            return None;
        }
        Some(self.insert(
            Slot::Object {
                peer: peer_id.to_string(),
                event: event.to_string(),
                object: object_id.to_string(),
            },
            Rc::new(handler),
        ))
    }

    /// Remove a registration. Returns `false` if the token is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.registry.borrow_mut().remove(id)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.shared.registry.borrow().len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Install or clear the dispatch observer.
    pub fn set_spy(&self, spy: Option<Rc<dyn EventSpy>>) {
        *self.shared.spy.borrow_mut() = spy;
    }

    /// Decode a raw transport message and dispatch it.
    ///
    /// Never panics and never returns an error: malformed and foreign
    /// messages are logged and discarded.
    pub fn decode_and_dispatch(&self, message: &InboundMessage) -> DispatchOutcome {
        match decode_envelope(&message.data, &self.shared.wire) {
            Err(err) => {
                tracing::warn!(source = %message.source, error = %err, "error processing message");
                DispatchOutcome::Malformed
            }
            Ok(Decoded::Foreign { name }) => {
                tracing::debug!(
                    source = %message.source,
                    name = name.as_deref().unwrap_or("<none>"),
                    "received a message outside the protocol namespace"
                );
                DispatchOutcome::Foreign
            }
            Ok(Decoded::Envelope(envelope)) => {
                tracing::debug!(
                    source = %message.source,
                    event = %envelope.name,
                    "received message"
                );
                let event = Event::from_envelope(envelope, message.source);
                DispatchOutcome::Dispatched(self.dispatch(&event))
            }
        }
    }

    /// Dispatch an already decoded event.
    ///
    /// The handler set is fixed when this is called; handlers registered
    /// while it runs see only later events.
    pub fn dispatch(&self, event: &Event) -> DispatchReport {
        let (handlers, counts) = self.shared.registry.borrow().matching(event);
        let mut report = DispatchReport {
            global: counts[0],
            peer: counts[1],
            object: counts[2],
            failed: 0,
        };

        for handler in handlers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(event)));
            if let Err(panic) = outcome {
                report.failed += 1;
                tracing::error!(
                    event = %event.name,
                    source = %event.source,
                    panic = panic_message(panic.as_ref()),
                    "event handler panicked"
                );
            }
        }

        let spy = self.shared.spy.borrow().clone();
        if let Some(spy) = spy {
            spy.observe(event, &report);
        }

        report
    }

    fn insert(&self, slot: Slot, handler: Handler) -> SubscriptionId {
        self.shared.registry.borrow_mut().insert(slot, handler)
    }
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("namespace", &self.shared.wire.namespace)
            .field("registrations", &self.len())
            .finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic>"
    }
}
