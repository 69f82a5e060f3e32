use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use playerlink_wire::{commands, EventKind, SharingType};

use crate::router::{Event, SubscriptionId};
use crate::session::{ComponentData, PeerSession};

use super::{param, unsupported, Notification, Scope};

const VIDEO: &str = "video";

/// One component of a ready experience.
#[derive(Clone)]
pub struct Component {
    session: Rc<PeerSession>,
    // (page, layer, object) indices into the snapshot.
    at: (usize, usize, usize),
    scope: Scope,
}

impl Component {
    pub(crate) fn new(
        session: Rc<PeerSession>,
        at: (usize, usize, usize),
        scope: Scope,
    ) -> Option<Self> {
        let (page, layer, object) = at;
        session
            .snapshot()
            .all_page_data
            .get(page)?
            .layers
            .get(layer)?
            .objects
            .get(object)?;
        Some(Self { session, at, scope })
    }

    fn data(&self) -> &ComponentData {
        let (page, layer, object) = self.at;
        &self.session.snapshot().all_page_data[page].layers[layer].objects[object]
    }

    pub fn id(&self) -> &str {
        &self.data().id
    }

    /// Component type as named by the player (`video`, `image`, ...).
    pub fn component_type(&self) -> &str {
        &self.data().component_type
    }

    pub fn tags(&self) -> &[String] {
        &self.data().tags
    }

    /// Payload exactly as configured in the authoring tool.
    pub fn payload(&self) -> &Value {
        &self.data().payload
    }

    pub fn is_video(&self) -> bool {
        self.component_type() == VIDEO
    }

    /// Start playback. Does nothing unless this is a video component.
    pub fn start_video(&self) {
        if self.is_video() {
            self.scope
                .send(commands::VIDEO_START, param("componentId", self.id()));
        }
    }

    /// Stop playback. Does nothing unless this is a video component.
    pub fn stop_video(&self) {
        if self.is_video() {
            self.scope
                .send(commands::VIDEO_STOP, param("componentId", self.id()));
        }
    }

    /// Trigger the click interactions configured on the component.
    pub fn click(&self) {
        self.scope
            .send(commands::COMPONENT_CLICK, param("componentId", self.id()));
    }

    pub fn show(&self) {
        self.scope
            .send(commands::COMPONENT_SHOW, param("componentId", self.id()));
    }

    pub fn hide(&self) {
        self.scope
            .send(commands::COMPONENT_HIDE, param("componentId", self.id()));
    }

    /// Call `callback` for events raised about this component.
    ///
    /// `social.share` delivers [`Notification::Share`]; clicks, animations
    /// and (for video components) playback deliver
    /// [`Notification::Component`].
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&Notification) + 'static,
    ) -> Option<SubscriptionId> {
        let component = self.clone();
        match kind {
            EventKind::SocialShare => self.scope.on_object(self.id(), kind, move |event: &Event| {
                callback(&Notification::Share {
                    component: component.clone(),
                    sharing: sharing_type(event),
                })
            }),
            EventKind::VideoPlayed if !self.is_video() => unsupported("component", kind),
            kind if kind.is_component_event() => {
                self.scope.on_object(self.id(), kind, move |_event: &Event| {
                    callback(&Notification::Component(component.clone()))
                })
            }
            _ => unsupported("component", kind),
        }
    }
}

pub(crate) fn sharing_type(event: &Event) -> Option<SharingType> {
    event.str_param("shareType").and_then(SharingType::from_wire)
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("peer_id", &self.scope.peer_id())
            .field("id", &self.id())
            .field("type", &self.component_type())
            .finish()
    }
}

/// Ordered group of components.
#[derive(Debug, Clone, Default)]
pub struct ComponentCollection {
    components: Vec<Component>,
}

impl ComponentCollection {
    pub(crate) fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    pub fn click(&self) {
        self.components.iter().for_each(Component::click);
    }

    pub fn show(&self) {
        self.components.iter().for_each(Component::show);
    }

    pub fn hide(&self) {
        self.components.iter().for_each(Component::hide);
    }

    /// Start playback on every video component in the collection.
    pub fn start_video(&self) {
        self.components.iter().for_each(Component::start_video);
    }

    /// Stop playback on every video component in the collection.
    pub fn stop_video(&self) {
        self.components.iter().for_each(Component::stop_video);
    }

    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&Notification) + 'static,
    ) -> Vec<SubscriptionId> {
        let callback = Rc::new(callback);
        self.components
            .iter()
            .filter_map(|component| {
                let callback = Rc::clone(&callback);
                component.subscribe(kind, move |notification: &Notification| {
                    callback(notification)
                })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ComponentCollection {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::facade::fixtures::Harness;

    #[test]
    fn commands_carry_component_id() {
        let harness = Harness::new();
        let image = harness.experience.find_component_by_id("c2").unwrap();

        image.click();
        image.show();
        image.hide();

        assert_eq!(
            harness.sent(),
            vec![
                ("sdk.component.click".to_string(), json!({"componentId": "c2"})),
                ("sdk.component.show".to_string(), json!({"componentId": "c2"})),
                ("sdk.component.hide".to_string(), json!({"componentId": "c2"})),
            ]
        );
    }

    #[test]
    fn video_commands_only_reach_video_components() {
        let harness = Harness::new();
        let media = harness.experience.find_components_by_tag("media");
        assert_eq!(media.len(), 2);

        media.start_video();
        media.stop_video();

        assert_eq!(
            harness.sent(),
            vec![
                ("sdk.component.video.start".to_string(), json!({"componentId": "c1"})),
                ("sdk.component.video.stop".to_string(), json!({"componentId": "c1"})),
            ]
        );
    }

    #[test]
    fn payload_is_returned_verbatim() {
        let harness = Harness::new();
        let video = harness.experience.find_component_by_id("c1").unwrap();
        assert_eq!(video.payload(), &json!("v"));
        assert_eq!(video.component_type(), "video");
        assert_eq!(video.tags(), ["media".to_string()]);
    }

    #[test]
    fn share_subscription_reports_sharing_type() {
        let harness = Harness::new();
        let share = harness.experience.find_component_by_id("c3").unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        share
            .subscribe(EventKind::SocialShare, move |notification: &Notification| {
                if let Notification::Share { component, sharing } = notification {
                    sink.borrow_mut().push((component.id().to_string(), *sharing));
                }
            })
            .unwrap();

        harness.deliver(
            "social.share",
            json!({"experienceId": "e1", "componentId": "c3", "shareType": "share-twitter"}),
        );
        harness.deliver(
            "social.share",
            json!({"experienceId": "e1", "componentId": "c3", "shareType": "share-myspace"}),
        );

        assert_eq!(
            *seen.borrow(),
            vec![
                ("c3".to_string(), Some(SharingType::Twitter)),
                ("c3".to_string(), None),
            ]
        );
    }

    #[test]
    fn video_played_requires_a_video_component() {
        let harness = Harness::new();
        let video = harness.experience.find_component_by_id("c1").unwrap();
        let image = harness.experience.find_component_by_id("c2").unwrap();

        assert!(video
            .subscribe(EventKind::VideoPlayed, |_n: &Notification| {})
            .is_some());
        assert!(image
            .subscribe(EventKind::VideoPlayed, |_n: &Notification| {})
            .is_none());
        assert!(image
            .subscribe(EventKind::LayerShown, |_n: &Notification| {})
            .is_none());
        assert_eq!(harness.router.len(), 1);
    }

    #[test]
    fn collection_subscription_fires_for_each_member() {
        let harness = Harness::new();
        let media = harness.experience.find_components_by_tag("media");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        media.subscribe(EventKind::ComponentClicked, move |notification: &Notification| {
            if let Some(component) = notification.component() {
                sink.borrow_mut().push(component.id().to_string());
            }
        });

        harness.deliver("component.clicked", json!({"experienceId": "e1", "componentId": "c1"}));
        harness.deliver("component.clicked", json!({"experienceId": "e1", "componentId": "c2"}));
        harness.deliver("component.clicked", json!({"experienceId": "e1", "componentId": "c3"}));

        assert_eq!(*seen.borrow(), vec!["c1", "c2"]);
    }
}
