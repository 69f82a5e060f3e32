use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use playerlink_transport::FrameHandle;
use playerlink_wire::{commands, EventKind, Params};

use crate::router::{Event, SubscriptionId};
use crate::session::{ExperienceSnapshot, PeerSession, TagGroup};

use super::component::sharing_type;
use super::{
    param, Component, ComponentCollection, Layer, LayerCollection, Notification, Page,
    PageCollection, Scope,
};

/// Id lookups into the snapshot. When ids repeat, the last one wins.
#[derive(Debug, Default)]
struct Index {
    pages: HashMap<String, usize>,
    layers: HashMap<String, (usize, usize)>,
    components: HashMap<String, (usize, usize, usize)>,
}

impl Index {
    fn build(snapshot: &ExperienceSnapshot) -> Self {
        let mut index = Index::default();
        for (p, page) in snapshot.all_page_data.iter().enumerate() {
            for (l, layer) in page.layers.iter().enumerate() {
                index.layers.insert(layer.id.clone(), (p, l));
                for (c, component) in layer.objects.iter().enumerate() {
                    index.components.insert(component.id.clone(), (p, l, c));
                }
            }
            index.pages.insert(page.page_slug.clone(), p);
        }
        index
    }
}

/// A ready embedded experience.
///
/// Obtained from [`Host::find_peer`](crate::Host::find_peer). Cloning is
/// cheap; clones share the peer's session, so the current page number seen
/// through any clone follows `page.changed` events.
#[derive(Clone)]
pub struct Experience {
    session: Rc<PeerSession>,
    index: Rc<Index>,
    scope: Scope,
}

impl Experience {
    pub(crate) fn new(session: Rc<PeerSession>, scope: Scope) -> Self {
        let index = Rc::new(Index::build(session.snapshot()));
        Self {
            session,
            index,
            scope,
        }
    }

    /// Peer id (`experienceId`).
    pub fn id(&self) -> &str {
        self.session.peer_id()
    }

    pub fn title(&self) -> &str {
        &self.session.snapshot().experience_title
    }

    /// Player alias, when the experience announced one.
    pub fn alias(&self) -> Option<&str> {
        self.session.snapshot().experience_alias.as_deref()
    }

    /// Opaque document version announced by the player.
    pub fn document_version(&self) -> &Value {
        &self.session.snapshot().document_version
    }

    /// Frame the experience lives in.
    pub fn frame(&self) -> FrameHandle {
        self.session.frame()
    }

    pub fn current_page_number(&self) -> u32 {
        self.session.current_page_number()
    }

    /// The page the experience is on now.
    ///
    /// `None` if the player reported a page number outside the snapshot.
    pub fn current_page(&self) -> Option<Page> {
        let position = usize::try_from(self.current_page_number())
            .ok()?
            .checked_sub(1)?;
        self.page_at(position)
    }

    /// Page with the given slug.
    pub fn find_page_by_id(&self, page_slug: &str) -> Option<Page> {
        let position = *self.index.pages.get(page_slug)?;
        self.page_at(position)
    }

    /// Pages tagged `tag`, in tag order. Unknown slugs are skipped.
    pub fn find_pages_by_tag(&self, tag: &str) -> PageCollection {
        let snapshot = self.session.snapshot();
        let Some(group) = snapshot.tags.get(tag) else {
            return PageCollection::default();
        };
        let pages = group
            .pages
            .iter()
            .flat_map(move |slug| {
                snapshot
                    .all_page_data
                    .iter()
                    .enumerate()
                    .filter(move |(_, page)| &page.page_slug == slug)
                    .map(|(position, _)| position)
            })
            .filter_map(|position| self.page_at(position))
            .collect();
        PageCollection::new(pages)
    }

    pub fn go_to_page(&self, page_number: u32) {
        self.scope
            .send(commands::PAGE_GOTO, param("pageNum", page_number));
    }

    pub fn go_to_next_page(&self) {
        self.scope.send(commands::PAGE_NEXT, Params::new());
    }

    pub fn go_to_previous_page(&self) {
        self.scope.send(commands::PAGE_PREVIOUS, Params::new());
    }

    /// Every layer of every page, in document order.
    pub fn find_all_layers(&self) -> LayerCollection {
        let layers = self
            .session
            .snapshot()
            .all_page_data
            .iter()
            .enumerate()
            .flat_map(|(p, page)| (0..page.layers.len()).map(move |l| (p, l)))
            .filter_map(|(p, l)| self.layer_at(p, l))
            .collect();
        LayerCollection::new(layers)
    }

    pub fn find_layer_by_id(&self, layer_id: &str) -> Option<Layer> {
        let (p, l) = *self.index.layers.get(layer_id)?;
        self.layer_at(p, l)
    }

    /// Layers tagged `tag`, in tag order. Unknown ids are skipped.
    pub fn find_layers_by_tag(&self, tag: &str) -> LayerCollection {
        let layers = self
            .tag_members(tag, |group| &group.layers)
            .filter_map(|id| self.find_layer_by_id(id))
            .collect();
        LayerCollection::new(layers)
    }

    pub fn find_component_by_id(&self, component_id: &str) -> Option<Component> {
        let at = *self.index.components.get(component_id)?;
        Component::new(Rc::clone(&self.session), at, self.scope.clone())
    }

    /// Components tagged `tag`, in tag order. Unknown ids are skipped.
    pub fn find_components_by_tag(&self, tag: &str) -> ComponentCollection {
        let components = self
            .tag_members(tag, |group| &group.components)
            .filter_map(|id| self.find_component_by_id(id))
            .collect();
        ComponentCollection::new(components)
    }

    /// Call `callback` for every `kind` event this experience raises.
    ///
    /// The callback receives the facade object the event is about: the
    /// current page for page events, the component for component and share
    /// events, the layer for layer events. Events naming an object missing
    /// from the snapshot are dropped.
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&Notification) + 'static,
    ) -> Option<SubscriptionId> {
        let experience = self.clone();
        self.scope.on_peer(kind, move |event: &Event| {
            match experience.rehydrate(kind, event) {
                Some(notification) => callback(&notification),
                None => tracing::debug!(
                    peer_id = %experience.id(),
                    event = %event.name,
                    "event names an object outside the snapshot, callback skipped"
                ),
            }
        })
    }

    fn rehydrate(&self, kind: EventKind, event: &Event) -> Option<Notification> {
        if kind.is_page_event() {
            return self.current_page().map(Notification::Page);
        }
        if kind.is_layer_event() {
            let layer = self.find_layer_by_id(&event.layer_id()?)?;
            return Some(Notification::Layer(layer));
        }
        let component = self.find_component_by_id(&event.component_id()?)?;
        if kind == EventKind::SocialShare {
            return Some(Notification::Share {
                component,
                sharing: sharing_type(event),
            });
        }
        Some(Notification::Component(component))
    }

    fn page_at(&self, position: usize) -> Option<Page> {
        Page::new(Rc::clone(&self.session), position, self.scope.clone())
    }

    fn layer_at(&self, page: usize, layer: usize) -> Option<Layer> {
        Layer::new(Rc::clone(&self.session), page, layer, self.scope.clone())
    }

    fn tag_members<'a>(
        &'a self,
        tag: &str,
        members: impl Fn(&'a TagGroup) -> &'a Vec<String>,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.session
            .snapshot()
            .tags
            .get(tag)
            .map(members)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }
}

impl fmt::Debug for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Experience")
            .field("id", &self.id())
            .field("frame", &self.frame())
            .field("title", &self.title())
            .field("current_page", &self.current_page_number())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::facade::fixtures::{Harness, FRAME};

    #[test]
    fn accessors_expose_snapshot() {
        let harness = Harness::new();
        let experience = &harness.experience;

        assert_eq!(experience.id(), "e1");
        assert_eq!(experience.title(), "Spring launch");
        assert_eq!(experience.frame(), FRAME);
        assert_eq!(experience.document_version()["viewportWidth"], 1024);
        assert_eq!(experience.current_page_number(), 1);
        assert_eq!(experience.current_page().unwrap().page_slug(), "intro");
        assert!(experience.alias().is_none());
    }

    #[test]
    fn finders_by_id() {
        let harness = Harness::new();
        let experience = &harness.experience;

        assert_eq!(experience.find_page_by_id("details").unwrap().page_number(), 2);
        assert!(experience.find_page_by_id("nope").is_none());
        assert_eq!(experience.find_layer_by_id("l2").unwrap().id(), "l2");
        assert!(experience.find_layer_by_id("l9").is_none());
        assert_eq!(
            experience.find_component_by_id("c3").unwrap().component_type(),
            "share"
        );
        assert!(experience.find_component_by_id("c9").is_none());
    }

    #[test]
    fn finders_by_tag_keep_tag_order_and_skip_unknown() {
        let harness = Harness::new();
        let experience = &harness.experience;

        let pages: Vec<u32> = experience
            .find_pages_by_tag("hero")
            .iter()
            .map(Page::page_number)
            .collect();
        assert_eq!(pages, vec![1]);

        let layers = experience.find_layers_by_tag("top");
        let layer_ids: Vec<&str> = layers.iter().map(Layer::id).collect();
        assert_eq!(layer_ids, vec!["l2", "l1"]);

        let components = experience.find_components_by_tag("media");
        let component_ids: Vec<&str> = components.iter().map(Component::id).collect();
        assert_eq!(component_ids, vec!["c2", "c1"]);

        assert!(experience.find_components_by_tag("absent").is_empty());
        assert!(experience.find_pages_by_tag("absent").is_empty());
    }

    #[test]
    fn find_all_layers_spans_pages() {
        let harness = Harness::new();
        let layers = harness.experience.find_all_layers();
        let ids: Vec<&str> = layers.iter().map(Layer::id).collect();
        assert_eq!(ids, vec!["l1", "l2"]);
    }

    #[test]
    fn navigation_commands() {
        let harness = Harness::new();
        harness.experience.go_to_page(2);
        harness.experience.go_to_next_page();
        harness.experience.go_to_previous_page();

        assert_eq!(
            harness.sent(),
            vec![
                ("sdk.experience.page.goto".to_string(), json!({"pageNum": 2})),
                ("sdk.experience.page.next".to_string(), json!({})),
                ("sdk.experience.page.previous".to_string(), json!({})),
            ]
        );
    }

    #[test]
    fn subscribe_rehydrates_facade_objects() {
        let harness = Harness::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for kind in [
            EventKind::ComponentClicked,
            EventKind::LayerHidden,
            EventKind::SocialShare,
            EventKind::PageChanging,
        ] {
            let sink = Rc::clone(&seen);
            harness
                .experience
                .subscribe(kind, move |notification: &Notification| {
                    let label = match notification {
                        Notification::Page(page) => format!("page:{}", page.page_slug()),
                        Notification::Component(component) => {
                            format!("component:{}", component.id())
                        }
                        Notification::Share { component, sharing } => format!(
                            "share:{}:{}",
                            component.id(),
                            sharing.map(|s| s.as_str()).unwrap_or("?")
                        ),
                        Notification::Layer(layer) => format!("layer:{}", layer.id()),
                    };
                    sink.borrow_mut().push(label);
                })
                .unwrap();
        }

        harness.deliver("component.clicked", json!({"experienceId": "e1", "componentId": "c2"}));
        harness.deliver("component.clicked", json!({"experienceId": "e1", "componentId": "zz"}));
        harness.deliver("layer.hidden", json!({"experienceId": "e1", "layerId": "l1"}));
        harness.deliver(
            "social.share",
            json!({"experienceId": "e1", "componentId": "c3", "shareType": "share-email"}),
        );
        harness.deliver("page.changing", json!({"experienceId": "e1"}));
        harness.deliver("component.clicked", json!({"experienceId": "e2", "componentId": "c2"}));

        assert_eq!(
            *seen.borrow(),
            vec![
                "component:c2",
                "layer:l1",
                "share:c3:email",
                "page:intro",
            ]
        );
    }

    #[test]
    fn current_page_follows_session() {
        let harness = Harness::new();
        harness.experience.session.set_current_page_number(2);
        assert_eq!(harness.experience.current_page().unwrap().page_slug(), "details");

        harness.experience.session.set_current_page_number(5);
        assert!(harness.experience.current_page().is_none());

        harness.experience.session.set_current_page_number(0);
        assert!(harness.experience.current_page().is_none());
    }
}
