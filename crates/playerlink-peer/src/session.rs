//! Snapshot data announced by a ready peer, and the per-peer session state.

use std::cell::Cell;
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use playerlink_transport::FrameHandle;
use playerlink_wire::Params;

use crate::error::Result;

/// Full content snapshot carried by a `ready` announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceSnapshot {
    #[serde(deserialize_with = "id_string")]
    pub experience_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_alias: Option<String>,
    #[serde(default)]
    pub experience_title: String,
    #[serde(default)]
    pub all_page_data: Vec<PageData>,
    #[serde(default)]
    pub document_version: Value,
    #[serde(default = "first_page")]
    pub current_page_number: u32,
    #[serde(default, deserialize_with = "tag_index")]
    pub tags: HashMap<String, TagGroup>,
}

impl ExperienceSnapshot {
    /// Parse the params object of a `ready` announcement.
    pub fn from_params(params: &Params) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(params.clone()))?)
    }

    /// Page with the given 1-based number.
    pub fn page(&self, page_number: u32) -> Option<&PageData> {
        self.all_page_data
            .iter()
            .find(|page| page.page_number == page_number)
    }
}

/// One page of the experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub page_number: u32,
    #[serde(default)]
    pub page_slug: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub layers: Vec<LayerData>,
}

/// One layer on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerData {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub objects: Vec<ComponentData>,
}

/// One component inside a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentData {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub component_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub payload: Value,
}

/// Members of one tag: page slugs, layer ids, component ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagGroup {
    #[serde(default)]
    pub pages: Vec<String>,
    #[serde(default)]
    pub layers: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
}

fn first_page() -> u32 {
    1
}

// Ids are strings on the wire, but numeric ids show up in older documents.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or numeric id, got {other}"
        ))),
    }
}

// An experience without tags serializes them as `null` or `[]`.
fn tag_index<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<HashMap<String, TagGroup>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(HashMap::new()),
        Value::Array(items) if items.is_empty() => Ok(HashMap::new()),
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

/// Live state for one ready peer.
///
/// Everything except the current page number is fixed at announcement time.
#[derive(Debug)]
pub struct PeerSession {
    peer_id: String,
    frame: FrameHandle,
    snapshot: ExperienceSnapshot,
    current_page: Cell<u32>,
}

impl PeerSession {
    pub fn new(frame: FrameHandle, snapshot: ExperienceSnapshot) -> Self {
        Self {
            peer_id: snapshot.experience_id.clone(),
            frame,
            current_page: Cell::new(snapshot.current_page_number),
            snapshot,
        }
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn frame(&self) -> FrameHandle {
        self.frame
    }

    pub fn snapshot(&self) -> &ExperienceSnapshot {
        &self.snapshot
    }

    pub fn current_page_number(&self) -> u32 {
        self.current_page.get()
    }

    pub fn set_current_page_number(&self, page_number: u32) {
        self.current_page.set(page_number);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("test params must be an object"),
        }
    }

    #[test]
    fn parses_full_ready_params() {
        let snapshot = ExperienceSnapshot::from_params(&params(json!({
            "experienceId": "e1",
            "experienceAlias": "landing",
            "experienceTitle": "Launch",
            "documentVersion": {"rev": 7},
            "currentPageNumber": 2,
            "allPageData": [
                {"pageNumber": 1, "pageSlug": "intro", "tags": ["hero"], "payload": "p1",
                 "layers": [
                    {"id": "l1", "tags": [], "payload": "", "objects": [
                        {"id": "c1", "type": "video", "tags": ["media"], "payload": "{\"src\":1}"}
                    ]}
                ]},
                {"pageNumber": 2, "pageSlug": "outro", "tags": [], "payload": "", "layers": []}
            ],
            "tags": {"media": {"pages": ["intro"], "layers": [], "components": ["c1"]}}
        })))
        .unwrap();

        assert_eq!(snapshot.experience_id, "e1");
        assert_eq!(snapshot.experience_alias.as_deref(), Some("landing"));
        assert_eq!(snapshot.current_page_number, 2);
        assert_eq!(snapshot.document_version, json!({"rev": 7}));
        assert_eq!(snapshot.page(1).unwrap().layers[0].objects[0].component_type, "video");
        assert_eq!(snapshot.tags["media"].components, vec!["c1"]);
        assert!(snapshot.page(3).is_none());
    }

    #[test]
    fn optional_fields_default() {
        let snapshot = ExperienceSnapshot::from_params(&params(json!({
            "experienceId": 99,
            "tags": []
        })))
        .unwrap();

        assert_eq!(snapshot.experience_id, "99");
        assert_eq!(snapshot.current_page_number, 1);
        assert!(snapshot.all_page_data.is_empty());
        assert!(snapshot.tags.is_empty());
        assert!(snapshot.experience_alias.is_none());
    }

    #[test]
    fn missing_experience_id_is_an_error() {
        assert!(ExperienceSnapshot::from_params(&params(json!({"experienceTitle": "x"}))).is_err());
        assert!(ExperienceSnapshot::from_params(&params(json!({"experienceId": true}))).is_err());
    }

    #[test]
    fn session_tracks_current_page() {
        let snapshot =
            ExperienceSnapshot::from_params(&params(json!({"experienceId": "e1"}))).unwrap();
        let session = PeerSession::new(FrameHandle::new(3), snapshot);

        assert_eq!(session.peer_id(), "e1");
        assert_eq!(session.frame(), FrameHandle::new(3));
        assert_eq!(session.current_page_number(), 1);
        session.set_current_page_number(4);
        assert_eq!(session.current_page_number(), 4);
        assert_eq!(session.snapshot().current_page_number, 1);
    }
}
