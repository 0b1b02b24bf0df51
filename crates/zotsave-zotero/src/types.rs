use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A library item as returned by the API: envelope key/version plus the
/// editable `data` object and server-computed `meta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub key: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub meta: ItemMeta,
    pub data: ItemData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemMeta {
    #[serde(rename = "creatorSummary", default, skip_serializing_if = "Option::is_none")]
    pub creator_summary: Option<String>,
    #[serde(rename = "parsedDate", default, skip_serializing_if = "Option::is_none")]
    pub parsed_date: Option<String>,
    #[serde(rename = "numChildren", default, skip_serializing_if = "Option::is_none")]
    pub num_children: Option<u32>,
}

/// The editable portion of an item. Only the fields zotsave reads or writes
/// are typed; everything else (type-specific fields like `publicationTitle`
/// or `volume`) is preserved in `other` so partial updates never drop data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemData {
    #[serde(rename = "itemType", default)]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "abstractNote", default, skip_serializing_if = "Option::is_none")]
    pub abstract_note: Option<String>,
    #[serde(rename = "DOI", default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    #[serde(default)]
    pub creators: Vec<Creator>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(rename = "contentType", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(rename = "linkMode", default, skip_serializing_if = "Option::is_none")]
    pub link_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(rename = "parentItem", default, skip_serializing_if = "Option::is_none")]
    pub parent_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Creator {
    #[serde(rename = "creatorType", default, skip_serializing_if = "Option::is_none")]
    pub creator_type: Option<String>,
    #[serde(rename = "firstName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Tags appear either as full objects (`{"tag": "x", "type": 1}`) or, in some
/// feeds, as bare strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Full {
        tag: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<u32>,
    },
    Name(String),
}

impl Tag {
    pub fn name(&self) -> &str {
        match self {
            Tag::Full { tag, .. } => tag,
            Tag::Name(name) => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub key: String,
    #[serde(default)]
    pub version: u64,
    pub data: CollectionData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionData {
    pub name: String,
    #[serde(rename = "parentCollection", default)]
    pub parent_collection: ParentCollection,
}

/// `parentCollection` is the literal `false` for root collections and a key
/// string otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentCollection {
    Key(String),
    Root(bool),
}

impl Default for ParentCollection {
    fn default() -> Self {
        ParentCollection::Root(false)
    }
}

impl ParentCollection {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            ParentCollection::Key(key) => Some(key),
            ParentCollection::Root(_) => None,
        }
    }
}

/// A page of list results. `total_results` comes from the `Total-Results`
/// response header, not the body.
#[derive(Debug, Clone)]
pub struct ListResponse<T> {
    pub total_results: Option<u64>,
    pub items: Vec<T>,
}

/// Response to a multi-object write. Maps are keyed by the index of the
/// object in the submitted array ("0", "1", ...).
#[derive(Debug, Default, Deserialize)]
pub struct WriteResponse {
    #[serde(default)]
    pub successful: BTreeMap<String, Item>,
    #[serde(default)]
    pub success: BTreeMap<String, String>,
    #[serde(default)]
    pub unchanged: BTreeMap<String, Value>,
    #[serde(default)]
    pub failed: BTreeMap<String, WriteFailure>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteFailure {
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub message: String,
}

impl WriteResponse {
    /// Key of the first successfully written object, if any.
    pub fn first_key(&self) -> Option<String> {
        self.successful
            .values()
            .next()
            .map(|item| item.key.clone())
            .or_else(|| self.success.values().next().cloned())
    }

    pub fn failure_message(&self) -> String {
        self.failed
            .values()
            .next()
            .map(|f| f.message.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub attachment_key: String,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Storage already had a file with this hash; no bytes were sent.
    Exists,
    Uploaded,
}

/// Response to an upload-authorization request. Either `exists` is set or the
/// remaining fields describe where to send the payload.
#[derive(Debug, Deserialize)]
pub struct UploadAuthorization {
    #[serde(default)]
    pub exists: Option<u8>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "contentType", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(rename = "uploadKey", default)]
    pub upload_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_forms() {
        let full: Tag = serde_json::from_str(r#"{"tag": "energy", "type": 1}"#).unwrap();
        assert_eq!(full.name(), "energy");
        let bare: Tag = serde_json::from_str(r#""climate""#).unwrap();
        assert_eq!(bare.name(), "climate");
    }

    #[test]
    fn test_parent_collection_forms() {
        let root: CollectionData = serde_json::from_str(r#"{"name": "Inbox", "parentCollection": false}"#).unwrap();
        assert!(root.parent_collection.as_key().is_none());
        let child: CollectionData =
            serde_json::from_str(r#"{"name": "Drafts", "parentCollection": "AB12CDEF"}"#).unwrap();
        assert_eq!(child.parent_collection.as_key(), Some("AB12CDEF"));
    }

    #[test]
    fn test_item_data_preserves_unknown_fields() {
        let json = r#"{
            "itemType": "journalArticle",
            "title": "On Things",
            "publicationTitle": "Journal of Things",
            "volume": "12"
        }"#;
        let data: ItemData = serde_json::from_str(json).unwrap();
        assert_eq!(data.other.get("publicationTitle").and_then(|v| v.as_str()), Some("Journal of Things"));
        let back = serde_json::to_value(&data).unwrap();
        assert_eq!(back["volume"], "12");
    }

    #[test]
    fn test_write_response_first_key() {
        let json = r#"{
            "successful": {"0": {"key": "NEWKEY01", "version": 10, "data": {"itemType": "webpage"}}},
            "success": {"0": "NEWKEY01"},
            "unchanged": {},
            "failed": {}
        }"#;
        let resp: WriteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_key().as_deref(), Some("NEWKEY01"));
    }

    #[test]
    fn test_write_response_failure_message() {
        let json = r#"{
            "successful": {},
            "failed": {"0": {"code": 400, "message": "'invalidType' is not a valid item type"}}
        }"#;
        let resp: WriteResponse = serde_json::from_str(json).unwrap();
        assert!(resp.first_key().is_none());
        assert_eq!(resp.failure_message(), "'invalidType' is not a valid item type");
    }
}
