use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use playerlink_wire::{commands, EventKind};

use crate::router::{Event, SubscriptionId};
use crate::session::{PageData, PeerSession};

use super::{param, unsupported, Layer, LayerCollection, Scope};

/// Client-side view of whether a page can be navigated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Enabled,
    Disabled,
}

impl PageState {
    pub fn as_str(self) -> &'static str {
        match self {
            PageState::Enabled => "enabled",
            PageState::Disabled => "disabled",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of a ready experience.
///
/// The enabled flag is local to this value: it starts enabled and follows
/// the `enable`/`disable` calls made through it. The player does not report
/// page state back.
#[derive(Clone)]
pub struct Page {
    session: Rc<PeerSession>,
    index: usize,
    enabled: Cell<bool>,
    scope: Scope,
}

impl Page {
    pub(crate) fn new(session: Rc<PeerSession>, index: usize, scope: Scope) -> Option<Self> {
        session.snapshot().all_page_data.get(index)?;
        Some(Self {
            session,
            index,
            enabled: Cell::new(true),
            scope,
        })
    }

    fn data(&self) -> &PageData {
        // Index checked in `new`; the snapshot never changes.
        &self.session.snapshot().all_page_data[self.index]
    }

    /// 1-based page number.
    pub fn page_number(&self) -> u32 {
        self.data().page_number
    }

    pub fn page_slug(&self) -> &str {
        &self.data().page_slug
    }

    pub fn tags(&self) -> &[String] {
        &self.data().tags
    }

    /// Payload configured for the page in the authoring tool.
    pub fn payload(&self) -> &Value {
        &self.data().payload
    }

    /// Allow navigation to this page again.
    pub fn enable(&self) {
        self.scope
            .send(commands::PAGE_ENABLE, param("pageNum", self.page_number()));
        self.enabled.set(true);
    }

    /// Block navigation to this page until re-enabled.
    pub fn disable(&self) {
        self.scope
            .send(commands::PAGE_DISABLE, param("pageNum", self.page_number()));
        self.enabled.set(false);
    }

    pub fn page_state(&self) -> PageState {
        if self.enabled.get() {
            PageState::Enabled
        } else {
            PageState::Disabled
        }
    }

    /// Layers on this page, in document order.
    pub fn find_all_layers(&self) -> LayerCollection {
        let layers = (0..self.data().layers.len())
            .filter_map(|layer| {
                Layer::new(
                    Rc::clone(&self.session),
                    self.index,
                    layer,
                    self.scope.clone(),
                )
            })
            .collect();
        LayerCollection::new(layers)
    }

    /// Run the entry animations configured on this page.
    pub fn start_animations(&self) {
        self.scope
            .send(commands::PAGE_ANIMATIONS_START, param("pageSlug", self.page_slug()));
    }

    /// Pause running animations on this page.
    pub fn pause_animations(&self) {
        self.scope
            .send(commands::PAGE_ANIMATIONS_PAUSE, param("pageSlug", self.page_slug()));
    }

    /// Call `callback` when the experience changes (or is changing) to this page.
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&Page) + 'static,
    ) -> Option<SubscriptionId> {
        if !kind.is_page_event() {
            return unsupported("page", kind);
        }
        let page = self.clone();
        self.scope.on_peer(kind, move |event: &Event| {
            if event.u32_param("pageNum") == Some(page.page_number()) {
                callback(&page);
            }
        })
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("peer_id", &self.scope.peer_id())
            .field("page_number", &self.page_number())
            .field("page_slug", &self.page_slug())
            .field("state", &self.page_state())
            .finish()
    }
}

/// Ordered group of pages.
#[derive(Debug, Clone, Default)]
pub struct PageCollection {
    pages: Vec<Page>,
}

impl PageCollection {
    pub(crate) fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.pages.iter()
    }

    pub fn enable(&self) {
        for page in &self.pages {
            page.enable();
        }
    }

    pub fn disable(&self) {
        for page in &self.pages {
            page.disable();
        }
    }

    /// Subscribe every page in the collection with the same callback.
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&Page) + 'static,
    ) -> Vec<SubscriptionId> {
        let callback = Rc::new(callback);
        self.pages
            .iter()
            .filter_map(|page| {
                let callback = Rc::clone(&callback);
                page.subscribe(kind, move |page: &Page| callback(page))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a PageCollection {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::facade::fixtures::Harness;

    #[test]
    fn enable_and_disable_send_page_number_and_track_state() {
        let harness = Harness::new();
        let page = harness.experience.find_page_by_id("details").unwrap();

        assert_eq!(page.page_state(), PageState::Enabled);
        page.disable();
        assert_eq!(page.page_state(), PageState::Disabled);
        page.enable();
        assert_eq!(page.page_state(), PageState::Enabled);

        assert_eq!(
            harness.sent(),
            vec![
                ("sdk.page.disable".to_string(), json!({"pageNum": 2})),
                ("sdk.page.enable".to_string(), json!({"pageNum": 2})),
            ]
        );
    }

    #[test]
    fn animations_address_the_page_slug() {
        let harness = Harness::new();
        let page = harness.experience.find_page_by_id("intro").unwrap();

        page.start_animations();
        page.pause_animations();

        assert_eq!(
            harness.sent(),
            vec![
                ("sdk.page.animations.start".to_string(), json!({"pageSlug": "intro"})),
                ("sdk.page.animations.pause".to_string(), json!({"pageSlug": "intro"})),
            ]
        );
    }

    #[test]
    fn find_all_layers_keeps_document_order() {
        let harness = Harness::new();
        let page = harness.experience.find_page_by_id("intro").unwrap();
        let layers = page.find_all_layers();
        let ids: Vec<&str> = layers.iter().map(Layer::id).collect();
        assert_eq!(ids, vec!["l1"]);
    }

    #[test]
    fn page_subscription_only_fires_for_its_own_page() {
        let harness = Harness::new();
        let page = harness.experience.find_page_by_id("details").unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        page.subscribe(EventKind::PageChanged, move |page: &Page| {
            sink.borrow_mut().push(page.page_slug().to_string())
        })
        .unwrap();

        harness.deliver("page.changed", json!({"experienceId": "e1", "pageNum": 1}));
        harness.deliver("page.changed", json!({"experienceId": "e1", "pageNum": 2}));
        harness.deliver("page.changed", json!({"experienceId": "e2", "pageNum": 2}));

        assert_eq!(*seen.borrow(), vec!["details"]);
    }

    #[test]
    fn non_page_events_are_not_supported_on_pages() {
        let harness = Harness::new();
        let page = harness.experience.current_page().unwrap();
        assert!(page
            .subscribe(EventKind::ComponentClicked, |_page: &Page| {})
            .is_none());
    }

    #[test]
    fn collection_fans_out_in_order() {
        let harness = Harness::new();
        let pages = PageCollection::new(vec![
            harness.experience.find_page_by_id("details").unwrap(),
            harness.experience.find_page_by_id("intro").unwrap(),
        ]);

        pages.disable();
        assert!(pages.iter().all(|page| page.page_state() == PageState::Disabled));

        let ids = pages.subscribe(EventKind::PageChanging, |_page: &Page| {});
        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);

        let sent: Vec<_> = harness.sent().into_iter().map(|(_, params)| params).collect();
        assert_eq!(sent, vec![json!({"pageNum": 2}), json!({"pageNum": 1})]);
    }
}
