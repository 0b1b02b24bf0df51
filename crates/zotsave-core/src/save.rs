use serde::Serialize;
use serde_json::{Map, Value};
use zotsave_zotero::{ZoteroClient, ZoteroError};

use crate::attach::{attach_pdf_from_url, attach_snapshot, AttachError, AttachOutcome};
use crate::item_type::resolve_item_type;
use crate::template::{creator_from_name, fill_template, set_if_declared, ItemMetadata};

#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    #[error("invalid item type {item_type:?}: {source}")]
    InvalidItemType {
        item_type: String,
        #[source]
        source: ZoteroError,
    },
    #[error("failed to create item: {0}")]
    CreateFailed(String),
    #[error("failed to update item: {0}")]
    UpdateFailed(String),
    #[error(transparent)]
    Zotero(#[from] ZoteroError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A complete save request: metadata for the new item plus optional
/// attachment sources.
#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    /// Alias or canonical item type; defaults to `webpage`.
    pub item_type: Option<String>,
    pub metadata: ItemMetadata,
    /// PDF to download and attach. Takes priority over `snapshot_url`.
    pub pdf_url: Option<String>,
    /// Page to store as an HTML snapshot when no PDF is available.
    pub snapshot_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveOutcome {
    pub success: bool,
    pub item_key: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_attachment: Option<AttachReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_attachment: Option<AttachReport>,
}

/// Attachment result embedded in a save outcome. An attachment failure does
/// not fail the save; the created item key is still reported alongside the
/// error.
#[derive(Debug, Serialize)]
pub struct AttachReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<AttachOutcome, AttachError>> for AttachReport {
    fn from(result: Result<AttachOutcome, AttachError>) -> Self {
        match result {
            Ok(outcome) => AttachReport {
                success: true,
                filename: Some(outcome.filename),
                size_bytes: Some(outcome.size_bytes),
                attachment_key: Some(outcome.attachment_key),
                error: None,
            },
            Err(e) => AttachReport {
                success: false,
                filename: None,
                size_bytes: None,
                attachment_key: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Create a new library item: resolve the type alias, fetch the type's
/// template, fill it with the supplied metadata, write it, then attach the
/// PDF or snapshot if one was requested.
pub async fn save_item(client: &ZoteroClient, request: &SaveRequest) -> Result<SaveOutcome, SaveError> {
    let alias = request.item_type.as_deref().unwrap_or("webpage");
    let item_type = resolve_item_type(alias);

    let template = client
        .item_template(&item_type)
        .await
        .map_err(|source| SaveError::InvalidItemType { item_type: item_type.clone(), source })?;
    let filled = fill_template(&template, &request.metadata);

    let response = client.create_items(&[Value::Object(filled)]).await?;
    let Some(item_key) = response.first_key() else {
        return Err(SaveError::CreateFailed(response.failure_message()));
    };
    tracing::info!(key = %item_key, item_type = %item_type, "created item");

    let mut outcome = SaveOutcome {
        success: true,
        item_key: item_key.clone(),
        message: format!("Created {item_type}: {}", request.metadata.title),
        pdf_attachment: None,
        snapshot_attachment: None,
    };
    if let Some(pdf_url) = request.pdf_url.as_deref() {
        outcome.pdf_attachment =
            Some(attach_pdf_from_url(client, &item_key, pdf_url, None).await.into());
    } else if let Some(snapshot_url) = request.snapshot_url.as_deref() {
        outcome.snapshot_attachment =
            Some(attach_snapshot(client, &item_key, snapshot_url, None).await.into());
    }
    Ok(outcome)
}

/// Partial metadata update for an existing item. Only supplied fields are
/// touched.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub date: Option<String>,
    pub url: Option<String>,
    pub abstract_text: Option<String>,
    pub publication: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
    pub extra: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct UpdateOutcome {
    pub success: bool,
    pub item_key: String,
    pub updated_fields: Vec<String>,
    pub message: String,
}

/// Update an existing item's metadata. The current item record supplies both
/// the concurrency version and the set of declared fields; the same sparse
/// merge as item creation applies, so no field is invented that the item's
/// type does not carry.
pub async fn update_metadata(
    client: &ZoteroClient,
    item_key: &str,
    request: &UpdateRequest,
) -> Result<UpdateOutcome, SaveError> {
    let item = client.get_item(item_key).await?;
    let declared = match serde_json::to_value(&item.data)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let mut patch = Map::new();
    let mut staged = declared.clone();
    set_if_declared(&mut staged, "title", request.title.as_deref());
    set_if_declared(&mut staged, "date", request.date.as_deref());
    set_if_declared(&mut staged, "url", request.url.as_deref());
    set_if_declared(&mut staged, "abstractNote", request.abstract_text.as_deref());
    set_if_declared(&mut staged, "extra", request.extra.as_deref());
    set_if_declared(&mut staged, "volume", request.volume.as_deref());
    set_if_declared(&mut staged, "issue", request.issue.as_deref());
    set_if_declared(&mut staged, "pages", request.pages.as_deref());
    set_if_declared(&mut staged, "DOI", request.doi.as_deref());
    if let Some(publication) = request.publication.as_deref().filter(|p| !p.is_empty()) {
        for field in ["publicationTitle", "blogTitle", "websiteTitle"] {
            if staged.contains_key(field) {
                staged.insert(field.to_string(), Value::String(publication.to_string()));
                break;
            }
        }
    }
    for (field, value) in &staged {
        if declared.get(field) != Some(value) {
            patch.insert(field.clone(), value.clone());
        }
    }

    if let Some(authors) = request.authors.as_ref().filter(|a| !a.is_empty()) {
        if declared.contains_key("creators") {
            let creators: Vec<Value> = authors.iter().map(|a| creator_from_name(a)).collect();
            patch.insert("creators".to_string(), Value::Array(creators));
        }
    }
    if let Some(tags) = request.tags.as_ref().filter(|t| !t.is_empty()) {
        let tags: Vec<Value> =
            tags.iter().map(|t| serde_json::json!({ "tag": t })).collect();
        patch.insert("tags".to_string(), Value::Array(tags));
    }

    if patch.is_empty() {
        return Err(SaveError::UpdateFailed(
            "no supplied field applies to this item type".to_string(),
        ));
    }

    let mut updated_fields: Vec<String> = patch.keys().cloned().collect();
    updated_fields.sort();
    client.update_item(&item.key, item.version, &patch).await?;
    tracing::info!(key = %item.key, fields = ?updated_fields, "updated item");

    Ok(UpdateOutcome {
        success: true,
        item_key: item.key.clone(),
        message: format!("Updated {}: {}", item.data.item_type, item.key),
        updated_fields,
    })
}
