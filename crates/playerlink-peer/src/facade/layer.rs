use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use playerlink_wire::{commands, EventKind};

use crate::router::{Event, SubscriptionId};
use crate::session::{LayerData, PeerSession};

use super::{param, unsupported, Component, ComponentCollection, Scope};

/// One layer of a ready experience.
#[derive(Clone)]
pub struct Layer {
    session: Rc<PeerSession>,
    page: usize,
    index: usize,
    scope: Scope,
}

impl Layer {
    pub(crate) fn new(
        session: Rc<PeerSession>,
        page: usize,
        index: usize,
        scope: Scope,
    ) -> Option<Self> {
        session
            .snapshot()
            .all_page_data
            .get(page)?
            .layers
            .get(index)?;
        Some(Self {
            session,
            page,
            index,
            scope,
        })
    }

    fn data(&self) -> &LayerData {
        &self.session.snapshot().all_page_data[self.page].layers[self.index]
    }

    pub fn id(&self) -> &str {
        &self.data().id
    }

    pub fn tags(&self) -> &[String] {
        &self.data().tags
    }

    pub fn payload(&self) -> &Value {
        &self.data().payload
    }

    pub fn show(&self) {
        self.scope.send(commands::LAYER_SHOW, param("layerId", self.id()));
    }

    pub fn hide(&self) {
        self.scope.send(commands::LAYER_HIDE, param("layerId", self.id()));
    }

    /// Components in this layer, in document order.
    pub fn find_all_components(&self) -> ComponentCollection {
        let components = (0..self.data().objects.len())
            .filter_map(|component| {
                Component::new(
                    Rc::clone(&self.session),
                    (self.page, self.index, component),
                    self.scope.clone(),
                )
            })
            .collect();
        ComponentCollection::new(components)
    }

    /// Call `callback` when this layer is shown or hidden.
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&Layer) + 'static,
    ) -> Option<SubscriptionId> {
        if !kind.is_layer_event() {
            return unsupported("layer", kind);
        }
        let layer = self.clone();
        self.scope
            .on_object(self.id(), kind, move |_event: &Event| callback(&layer))
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("peer_id", &self.scope.peer_id())
            .field("id", &self.id())
            .finish()
    }
}

/// Ordered group of layers.
#[derive(Debug, Clone, Default)]
pub struct LayerCollection {
    layers: Vec<Layer>,
}

impl LayerCollection {
    pub(crate) fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Layer> {
        self.layers.iter()
    }

    pub fn show(&self) {
        for layer in &self.layers {
            layer.show();
        }
    }

    pub fn hide(&self) {
        for layer in &self.layers {
            layer.hide();
        }
    }

    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&Layer) + 'static,
    ) -> Vec<SubscriptionId> {
        let callback = Rc::new(callback);
        self.layers
            .iter()
            .filter_map(|layer| {
                let callback = Rc::clone(&callback);
                layer.subscribe(kind, move |layer: &Layer| callback(layer))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a LayerCollection {
    type Item = &'a Layer;
    type IntoIter = std::slice::Iter<'a, Layer>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}
