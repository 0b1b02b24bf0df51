use schemars::JsonSchema;
use serde::Deserialize;
use zotsave_core::template::ItemMetadata;
use zotsave_core::{SaveRequest, UpdateRequest};

/// Deserialize `Option<u32>` accepting both JSON integers and quoted strings.
/// Some MCP clients serialize numeric parameters as strings ("10" vs 10).
fn lax_optional_u32<'de, D>(d: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Lax {
        Int(u32),
        Str(String),
    }
    match Option::<Lax>::deserialize(d)? {
        None => Ok(None),
        Some(Lax::Int(n)) => Ok(Some(n)),
        Some(Lax::Str(s)) if s.is_empty() => Ok(None),
        Some(Lax::Str(s)) => s.parse::<u32>().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parameters for the `save_to_zotero` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SaveToolParams {
    /// Item title (required).
    pub title: String,
    /// Type of item: article, journal, book, chapter, conference, thesis,
    /// report, webpage, blog, news, magazine, document, legal, case, patent,
    /// video, podcast, presentation. Defaults to `webpage`.
    pub item_type: Option<String>,
    /// Author display names (e.g. `["John Smith", "Jane Doe"]`); can be
    /// organizations like "Department of Energy" or "WHO".
    pub authors: Option<Vec<String>>,
    /// Publication date (e.g. "2025-07-25", "July 2025", or "2025").
    pub date: Option<String>,
    /// URL of the item (always include for web sources).
    pub url: Option<String>,
    /// Abstract or summary; write one if the source lacks it.
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Journal/publication/website name.
    pub publication: Option<String>,
    /// Volume number.
    pub volume: Option<String>,
    /// Issue number.
    pub issue: Option<String>,
    /// Page range (e.g. "1-10").
    pub pages: Option<String>,
    /// DOI identifier.
    pub doi: Option<String>,
    /// 2-5 descriptive tags based on content topics (always include).
    pub tags: Option<Vec<String>>,
    /// Collection key (call `list_collections` first).
    pub collection_id: Option<String>,
    /// URL to download a PDF attachment from (preferred over snapshot).
    pub pdf_url: Option<String>,
    /// URL to save as an HTML snapshot (used if no `pdf_url`).
    pub snapshot_url: Option<String>,
    /// Additional notes for the "Extra" field.
    pub extra: Option<String>,
}

impl SaveToolParams {
    pub fn into_save_request(self) -> SaveRequest {
        SaveRequest {
            item_type: self.item_type,
            metadata: ItemMetadata {
                title: self.title,
                authors: self.authors.unwrap_or_default(),
                date: self.date,
                url: self.url,
                abstract_text: self.abstract_text,
                publication: self.publication,
                volume: self.volume,
                issue: self.issue,
                pages: self.pages,
                doi: self.doi,
                extra: self.extra,
                tags: self.tags.unwrap_or_default(),
                collection_id: self.collection_id,
            },
            pdf_url: self.pdf_url,
            snapshot_url: self.snapshot_url,
        }
    }
}

/// Parameters for the `attach_pdf_from_url` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AttachPdfToolParams {
    /// Key of the parent item to attach to (from `save_to_zotero`).
    pub parent_item_key: String,
    /// URL to download the PDF from.
    pub pdf_url: String,
    /// Optional filename (auto-generated when omitted).
    pub filename: Option<String>,
}

/// Parameters for the `attach_snapshot` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AttachSnapshotToolParams {
    /// Key of the parent item to attach to (from `save_to_zotero`).
    pub parent_item_key: String,
    /// URL of the webpage to snapshot.
    pub url: String,
    /// Optional title (auto-extracted from the page when omitted).
    pub title: Option<String>,
}

/// Parameters for the `create_note` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateNoteToolParams {
    /// Key of the item to attach the note to.
    pub parent_item_key: String,
    /// Note content; HTML is allowed (e.g. `<p>...</p>`).
    pub note: String,
}

/// Parameters for the `update_item` tool. Only supplied fields are changed,
/// and only when the item's type carries them.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateItemToolParams {
    /// Key of the item to update.
    pub item_key: String,
    pub title: Option<String>,
    /// Replacement author list (replaces all creators).
    pub authors: Option<Vec<String>>,
    pub date: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub publication: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
    pub extra: Option<String>,
    /// Replacement tag list (replaces all tags).
    pub tags: Option<Vec<String>>,
}

impl UpdateItemToolParams {
    pub fn into_update_request(self) -> (String, UpdateRequest) {
        let request = UpdateRequest {
            title: self.title,
            authors: self.authors,
            date: self.date,
            url: self.url,
            abstract_text: self.abstract_text,
            publication: self.publication,
            volume: self.volume,
            issue: self.issue,
            pages: self.pages,
            doi: self.doi,
            extra: self.extra,
            tags: self.tags,
        };
        (self.item_key, request)
    }
}

/// Parameters for the `search_items` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchToolParams {
    /// Quick text search (title, creator, year).
    pub query: String,
    /// When true, expand the search to all fields and full-text content.
    #[serde(default)]
    pub everything: bool,
    /// Results per page (1-100, default 25).
    #[serde(default, deserialize_with = "lax_optional_u32")]
    pub limit: Option<u32>,
    /// Pagination offset (0-based).
    #[serde(default, deserialize_with = "lax_optional_u32")]
    pub start: Option<u32>,
}

/// Parameters for the `collection_items` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CollectionItemsToolParams {
    /// Collection key (call `list_collections` to find it).
    pub collection_id: String,
    /// Results per page (1-100, default 25).
    #[serde(default, deserialize_with = "lax_optional_u32")]
    pub limit: Option<u32>,
    /// Pagination offset (0-based).
    #[serde(default, deserialize_with = "lax_optional_u32")]
    pub start: Option<u32>,
}

/// Parameters for the `recent_items` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RecentItemsToolParams {
    /// Number of items to return (1-100, default 25).
    #[serde(default, deserialize_with = "lax_optional_u32")]
    pub limit: Option<u32>,
}

/// Parameters for the `prepare_url` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PrepareUrlToolParams {
    /// The URL you want to fetch content from.
    pub url: String,
}

/// Parameters for `setup_library_id` (step 1 of setup).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetupLibraryIdToolParams {
    /// Your Zotero user ID number (e.g. "1234567"), shown at
    /// https://www.zotero.org/settings/keys.
    pub library_id: String,
}

/// Parameters for `setup_api_key` (step 2 of setup).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetupApiKeyToolParams {
    /// Your Zotero API key. Treat it as a secret; it is never echoed back.
    pub api_key: String,
}

/// Parameters for tools that take no arguments.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NoParams {}
