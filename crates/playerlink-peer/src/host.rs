use std::fmt;
use std::rc::Rc;

use playerlink_transport::{FrameHandle, InboundMessage, Transport};
use playerlink_wire::READY;

use crate::config::HostConfig;
use crate::error::Result;
use crate::messenger::TransportSlot;
use crate::router::{DispatchOutcome, Event, EventRouter, EventSpy};
use crate::session::ExperienceSnapshot;
use crate::tracker::{InstanceTracker, PeerDeferred};

/// Host-side entry point: one per embedding page.
///
/// Owns the event router, the instance tracker and the outbound transport.
/// Feed every inbound transport message to [`Host::handle_message`].
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use playerlink_peer::Host;
/// use playerlink_transport::{FrameHandle, InboundMessage, RecordingTransport};
///
/// let transport = RecordingTransport::new();
/// let host = Host::new(Rc::new(transport.clone()));
/// host.initialize([FrameHandle::new(1)]);
///
/// host.find_peer("e1").on_success(|experience| experience.go_to_next_page());
/// host.handle_message(&InboundMessage::new(
///     FrameHandle::new(1),
///     r#"{"name":"ceros.sdk.player:ready","params":{"experienceId":"e1"}}"#,
/// ));
///
/// assert_eq!(transport.len(), 1);
/// ```
pub struct Host {
    router: EventRouter,
    tracker: InstanceTracker,
    transport: TransportSlot,
    config: HostConfig,
}

impl Host {
    /// Create a host with default configuration.
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self::build(HostConfig::default(), transport)
    }

    /// Create a host with a custom configuration.
    pub fn with_config(config: HostConfig, transport: Rc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, transport))
    }

    fn build(config: HostConfig, transport: Rc<dyn Transport>) -> Self {
        let router = EventRouter::new(Rc::new(config.wire.clone()));
        let transport = TransportSlot::new(transport);
        let tracker = InstanceTracker::new(router.clone(), transport.clone(), &config);

        let weak = tracker.downgrade();
        router.register_global(READY, move |event: &Event| {
            let Some(tracker) = weak.upgrade() else {
                return;
            };
            match ExperienceSnapshot::from_params(&event.params) {
                Ok(snapshot) => {
                    tracker.on_ready(snapshot, event.source);
                }
                Err(err) => {
                    tracing::warn!(
                        source = %event.source,
                        error = %err,
                        "unreadable ready announcement"
                    );
                }
            }
        });

        Self {
            router,
            tracker,
            transport,
            config,
        }
    }

    /// Record the frames expected to host peers. Announcements that arrived
    /// earlier are replayed now.
    pub fn initialize(&self, frames: impl IntoIterator<Item = FrameHandle>) {
        self.tracker.initialize(frames);
    }

    /// Decode and dispatch one inbound transport message.
    pub fn handle_message(&self, message: &InboundMessage) -> DispatchOutcome {
        self.router.decode_and_dispatch(message)
    }

    /// The facade for `peer_id`, once it is ready.
    pub fn find_peer(&self, peer_id: &str) -> PeerDeferred {
        self.tracker.lookup(peer_id)
    }

    /// Await a frame inserted after discovery, identified by the alias its
    /// experience announces.
    pub fn insert_peer(&self, alias: &str) -> PeerDeferred {
        self.tracker.insert(alias)
    }

    /// Declare the expected set final; pending lookups are rejected.
    pub fn seal(&self) {
        self.tracker.seal();
    }

    pub fn all_loaded(&self) -> bool {
        self.tracker.is_all_loaded()
    }

    /// Route all outbound traffic, including from existing facades, through
    /// `transport`.
    pub fn set_transport(&self, transport: Rc<dyn Transport>) {
        self.transport.replace(transport);
    }

    /// Observe every dispatched event.
    pub fn set_event_spy(&self, spy: impl EventSpy + 'static) {
        self.router.set_spy(Some(Rc::new(spy)));
    }

    pub fn clear_event_spy(&self) {
        self.router.set_spy(None);
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn tracker(&self) -> &InstanceTracker {
        &self.tracker
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("router", &self.router)
            .field("tracker", &self.tracker)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use playerlink_transport::RecordingTransport;
    use playerlink_wire::WireConfig;

    use super::*;
    use crate::deferred::DeferredState;
    use crate::error::PeerError;
    use crate::router::DispatchReport;

    fn ready(frame: u64, peer_id: &str) -> InboundMessage {
        InboundMessage::new(
            FrameHandle::new(frame),
            json!({
                "name": "ceros.sdk.player:ready",
                "version": "1.0.0",
                "params": {"experienceId": peer_id, "experienceTitle": peer_id}
            })
            .to_string(),
        )
    }

    #[test]
    fn ready_through_the_router_resolves_find_peer() {
        let host = Host::new(Rc::new(RecordingTransport::new()));
        host.initialize([FrameHandle::new(1)]);
        let deferred = host.find_peer("e1");

        let outcome = host.handle_message(&ready(1, "e1"));

        assert!(matches!(outcome, DispatchOutcome::Dispatched(r) if r.global == 1));
        assert_eq!(deferred.state(), DeferredState::Resolved);
        assert!(host.all_loaded());
    }

    #[test]
    fn unreadable_ready_is_dropped() {
        let host = Host::new(Rc::new(RecordingTransport::new()));
        host.initialize([FrameHandle::new(1)]);
        let deferred = host.find_peer("e1");

        host.handle_message(&InboundMessage::new(
            FrameHandle::new(1),
            r#"{"name":"ceros.sdk.player:ready","params":{"experienceTitle":"no id"}}"#,
        ));

        assert!(deferred.is_pending());
        assert_eq!(host.tracker().loaded_count(), 0);
    }

    #[test]
    fn replacing_the_transport_redirects_existing_facades() {
        let first = RecordingTransport::new();
        let second = RecordingTransport::new();
        let host = Host::new(Rc::new(first.clone()));
        host.initialize([FrameHandle::new(1)]);
        host.handle_message(&ready(1, "e1"));
        let experience = host.find_peer("e1").value().unwrap();

        experience.go_to_next_page();
        host.set_transport(Rc::new(second.clone()));
        experience.go_to_previous_page();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(second.posted()[0].target, FrameHandle::new(1));
    }

    #[test]
    fn event_spy_sees_dispatches() {
        let host = Host::new(Rc::new(RecordingTransport::new()));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        host.set_event_spy(move |event: &Event, report: &DispatchReport| {
            sink.borrow_mut().push((event.name.clone(), report.total()))
        });

        host.handle_message(&ready(1, "e1"));
        host.clear_event_spy();
        host.handle_message(&ready(2, "e2"));

        assert_eq!(*seen.borrow(), vec![("ready".to_string(), 1)]);
    }

    #[test]
    fn custom_namespace_is_validated_and_used() {
        let bad = HostConfig::default().with_wire(WireConfig::default().with_namespace(""));
        assert!(matches!(
            Host::with_config(bad, Rc::new(RecordingTransport::new())),
            Err(PeerError::Wire(_))
        ));

        let transport = RecordingTransport::new();
        let config = HostConfig::default().with_wire(WireConfig::default().with_namespace("acme:"));
        let host = Host::with_config(config, Rc::new(transport.clone())).unwrap();
        host.initialize([FrameHandle::new(3)]);

        assert_eq!(host.handle_message(&ready(3, "e1")), DispatchOutcome::Foreign);
        host.handle_message(&InboundMessage::new(
            FrameHandle::new(3),
            r#"{"name":"acme:ready","params":{"experienceId":"e1"}}"#,
        ));

        let experience = host.find_peer("e1").value().unwrap();
        experience.go_to_page(2);
        assert!(transport.posted()[0].payload.contains("\"acme:sdk.experience.page.goto\""));
    }
}
