use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;
use serde_json::json;
use zotsave_core::{config, known_aliases, listing, save_item, update_metadata};
use zotsave_zotero::{CollectionListParams, ZoteroClient};

use crate::params::{
    AttachPdfToolParams, AttachSnapshotToolParams, CollectionItemsToolParams,
    CreateNoteToolParams, NoParams, PrepareUrlToolParams, RecentItemsToolParams,
    SaveToolParams, SearchToolParams, SetupApiKeyToolParams, SetupLibraryIdToolParams,
    UpdateItemToolParams,
};

#[derive(Clone)]
pub struct ZotsaveMcp {
    zotero: Arc<tokio::sync::Mutex<Option<ZoteroClient>>>,
    pending_library_id: Arc<tokio::sync::Mutex<Option<String>>>,
    tool_router: ToolRouter<Self>,
}

impl Default for ZotsaveMcp {
    fn default() -> Self {
        Self::new()
    }
}

impl ZotsaveMcp {
    pub fn new() -> Self {
        Self {
            zotero: Arc::new(tokio::sync::Mutex::new(None)),
            pending_library_id: Arc::new(tokio::sync::Mutex::new(None)),
            tool_router: Self::tool_router(),
        }
    }

    /// Create a server with an explicit Zotero client (for testing).
    pub fn with_zotero(zotero: ZoteroClient) -> Self {
        Self {
            zotero: Arc::new(tokio::sync::Mutex::new(Some(zotero))),
            pending_library_id: Arc::new(tokio::sync::Mutex::new(None)),
            tool_router: Self::tool_router(),
        }
    }

    /// Get the Zotero client, building one from the environment on first
    /// use. A successful connection is cached for future calls.
    async fn require_zotero(&self) -> Result<ZoteroClient, String> {
        let mut lock = self.zotero.lock().await;
        if let Some(client) = lock.as_ref() {
            return Ok(client.clone());
        }
        match ZoteroClient::from_env() {
            Ok(client) => {
                *lock = Some(client.clone());
                Ok(client)
            }
            Err(e) => Err(format!(
                "{e}. Alternatively call setup_library_id then setup_api_key."
            )),
        }
    }
}

fn json_result<T: Serialize, E: std::fmt::Display>(result: Result<T, E>) -> Result<String, String> {
    match result {
        Ok(response) => serde_json::to_string_pretty(&response)
            .map_err(|e| format!("JSON serialization error: {e}")),
        Err(e) => Err(e.to_string()),
    }
}

#[tool_router(vis = "pub")]
impl ZotsaveMcp {
    // ── Guidance tools ───────────────────────────────────────────────────

    /// Get workflow instructions for adding items to Zotero. Call this at the
    /// start of a new Zotero task, or whenever you're unsure how to proceed.
    #[tool]
    pub async fn zotero_help(&self, Parameters(_p): Parameters<NoParams>) -> Result<String, String> {
        json_result::<_, String>(Ok(json!({
            "workflow": {
                "step1_fetch": "Use YOUR OWN built-in tools to fetch the URL content \
                    (web_fetch, read_url, or browser tools). Avoid opening new browser \
                    tabs just to read content.",
                "step2_extract": "Read the content and extract metadata: title, authors \
                    (may be organizations), date, abstract (write one if missing), \
                    publisher/website name, and 2-5 descriptive tags.",
                "step3_find_collection": "Call list_collections to find the right folder. \
                    If the user didn't specify and multiple options match, ask them.",
                "step4_assess_confidence": "If confident (clear metadata, no guessing) \
                    proceed. If uncertain (messy source, wrote abstract, guessed fields) \
                    ask the user to confirm.",
                "step5_save": "Call save_to_zotero with all extracted metadata. Include \
                    pdf_url if a PDF is available, OR snapshot_url for webpages.",
            },
            "available_tools": [
                "save_to_zotero - Save an item with metadata and attachments",
                "list_collections - Find collection keys",
                "zotero_item_types - See valid item types",
                "attach_pdf_from_url - Add a PDF to an existing item",
                "attach_snapshot - Add a webpage snapshot to an existing item",
                "create_note - Add a note to an existing item",
                "update_item - Fix metadata on an existing item",
                "search_items / collection_items / recent_items - Browse the library",
            ],
            "tips": [
                "Always include tags (2-5 descriptive keywords)",
                "Write an abstract if the source lacks one",
                "Authors can be organizations like 'World Health Organization'",
                "Use snapshot_url for webpages, pdf_url for documents",
            ],
        })))
    }

    /// Get instructions for fetching a URL's content before saving to Zotero.
    /// This tool does NOT fetch anything itself; it tells you which of your
    /// own tools to use and what to do next.
    #[tool]
    pub async fn prepare_url(&self, Parameters(p): Parameters<PrepareUrlToolParams>) -> Result<String, String> {
        let lower = p.url.to_lowercase();
        let is_pdf = lower.ends_with(".pdf") || lower.contains("/pdf/");
        let instructions = if is_pdf {
            "This appears to be a PDF. When you call save_to_zotero, include this URL as \
             the pdf_url parameter to attach it. Extract metadata from the PDF content or \
             the page linking to it."
        } else {
            "Do not open a browser tab for this URL. Use your built-in web_fetch or \
             read_url tool to get the content, then extract the metadata and call \
             save_to_zotero."
        };
        let attach_hint = if is_pdf {
            format!("and pdf_url='{}'", p.url)
        } else {
            format!("and snapshot_url='{}'", p.url)
        };
        json_result::<_, String>(Ok(json!({
            "url": p.url,
            "is_pdf": is_pdf,
            "instructions": instructions,
            "next_steps": [
                format!("1. Fetch content from {} using your internal tools", p.url),
                "2. Extract: title, authors, date, abstract, tags".to_string(),
                "3. Call list_collections to find the right folder".to_string(),
                format!("4. Call save_to_zotero with all metadata {attach_hint}"),
            ],
        })))
    }

    // ── Write tools ──────────────────────────────────────────────────────

    /// Create a new item in the Zotero library from extracted metadata.
    /// Include pdf_url if a PDF is available, OR snapshot_url for webpages
    /// (PDF takes priority if both are provided); this preserves the source.
    /// Returns the created item key plus any attachment result.
    #[tool]
    pub async fn save_to_zotero(&self, Parameters(p): Parameters<SaveToolParams>) -> Result<String, String> {
        let zotero = self.require_zotero().await?;
        json_result(save_item(&zotero, &p.into_save_request()).await)
    }

    /// Download a PDF from a URL and attach it to an existing item.
    /// Wrapper/proxy URLs (renderers, screenshot services) are unwrapped
    /// to the real document first.
    #[tool]
    pub async fn attach_pdf_from_url(&self, Parameters(p): Parameters<AttachPdfToolParams>) -> Result<String, String> {
        let zotero = self.require_zotero().await?;
        json_result(
            zotsave_core::attach_pdf_from_url(
                &zotero,
                &p.parent_item_key,
                &p.pdf_url,
                p.filename.as_deref(),
            )
            .await,
        )
    }

    /// Save a webpage as an HTML snapshot and attach it to an existing item.
    /// Call this after save_to_zotero for webpage sources; web content can
    /// change or disappear, and snapshots preserve it.
    #[tool]
    pub async fn attach_snapshot(&self, Parameters(p): Parameters<AttachSnapshotToolParams>) -> Result<String, String> {
        let zotero = self.require_zotero().await?;
        json_result(
            zotsave_core::attach_snapshot(&zotero, &p.parent_item_key, &p.url, p.title.as_deref())
                .await,
        )
    }

    /// Attach a text note to an existing item (HTML allowed).
    #[tool]
    pub async fn create_note(&self, Parameters(p): Parameters<CreateNoteToolParams>) -> Result<String, String> {
        let zotero = self.require_zotero().await?;
        match zotero.create_note(&p.parent_item_key, &p.note).await {
            Ok(note_key) => json_result::<_, String>(Ok(json!({
                "success": true,
                "note_key": note_key,
                "parent_item_key": p.parent_item_key,
            }))),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Update metadata on an existing item. Only supplied fields are changed,
    /// and only when the item's type carries them; authors and tags replace
    /// the existing lists.
    #[tool]
    pub async fn update_item(&self, Parameters(p): Parameters<UpdateItemToolParams>) -> Result<String, String> {
        let zotero = self.require_zotero().await?;
        let (item_key, request) = p.into_update_request();
        json_result(update_metadata(&zotero, &item_key, &request).await)
    }

    // ── Browse tools ─────────────────────────────────────────────────────

    /// Search top-level library items by title, creator, or year (set
    /// everything=true for full-text search). Attachments and notes are
    /// excluded from the results.
    #[tool]
    pub async fn search_items(&self, Parameters(p): Parameters<SearchToolParams>) -> Result<String, String> {
        let zotero = self.require_zotero().await?;
        json_result(listing::search_items(&zotero, &p.query, p.everything, p.limit, p.start).await)
    }

    /// List the top-level items of a collection. Attachments and notes are
    /// excluded from the results.
    #[tool]
    pub async fn collection_items(&self, Parameters(p): Parameters<CollectionItemsToolParams>) -> Result<String, String> {
        let zotero = self.require_zotero().await?;
        json_result(listing::collection_items(&zotero, &p.collection_id, p.limit, p.start).await)
    }

    /// List the most recently added items in the library. Attachments and
    /// notes are excluded from the results.
    #[tool]
    pub async fn recent_items(&self, Parameters(p): Parameters<RecentItemsToolParams>) -> Result<String, String> {
        let zotero = self.require_zotero().await?;
        json_result(listing::recent_items(&zotero, p.limit).await)
    }

    /// List all collections (folders) in the library. Call this before
    /// save_to_zotero to find the right collection_id.
    #[tool]
    pub async fn list_collections(&self, Parameters(_p): Parameters<NoParams>) -> Result<String, String> {
        let zotero = self.require_zotero().await?;
        let response = zotero
            .list_collections(&CollectionListParams::default())
            .await
            .map_err(|e| e.to_string())?;
        let rows: Vec<_> = response
            .items
            .iter()
            .map(|c| {
                json!({
                    "key": c.key,
                    "name": c.data.name,
                    "parent": c.data.parent_collection.as_key(),
                })
            })
            .collect();
        json_result::<_, String>(Ok(rows))
    }

    /// List the item-type names accepted by save_to_zotero.
    #[tool]
    pub async fn zotero_item_types(&self, Parameters(_p): Parameters<NoParams>) -> Result<String, String> {
        json_result::<_, String>(Ok(known_aliases()))
    }

    // ── Setup tools ──────────────────────────────────────────────────────

    /// Step 1 of Zotero setup: set your library ID. Find it at
    /// https://www.zotero.org/settings/keys ("Your userID for use in API
    /// calls"). After this succeeds, call setup_api_key.
    #[tool]
    pub async fn setup_library_id(&self, Parameters(p): Parameters<SetupLibraryIdToolParams>) -> Result<String, String> {
        let mut pending = self.pending_library_id.lock().await;
        *pending = Some(p.library_id.clone());
        json_result::<_, String>(Ok(json!({
            "success": true,
            "library_id": p.library_id,
            "next_step": "Now call setup_api_key with the user's API key",
        })))
    }

    /// Step 2 of Zotero setup: set the API key and connect. Validates the
    /// credentials against the API and saves them to .env for future
    /// sessions. The key is treated as a secret and never echoed back.
    #[tool]
    pub async fn setup_api_key(&self, Parameters(p): Parameters<SetupApiKeyToolParams>) -> Result<String, String> {
        let library_id = {
            let pending = self.pending_library_id.lock().await;
            pending
                .clone()
                .ok_or_else(|| "Library ID not set. Call setup_library_id first.".to_string())?
        };

        let client = ZoteroClient::new(library_id.clone(), p.api_key.clone());
        if let Err(e) = client.get_key_info().await {
            return Err(format!(
                "{e}. Double-check your API key; the library ID looks fine."
            ));
        }

        {
            let mut lock = self.zotero.lock().await;
            *lock = Some(client);
        }
        let env_path = config::default_env_path();
        if let Err(e) = config::save_credentials(&env_path, &library_id, &p.api_key) {
            tracing::warn!(path = %env_path.display(), error = %e, "could not persist credentials");
        }

        json_result::<_, String>(Ok(json!({
            "success": true,
            "message": "Connected to Zotero and saved credentials",
            "library_id": library_id,
        })))
    }
}

#[tool_handler]
impl ServerHandler for ZotsaveMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: "add-to-zotero".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MCP server for saving web sources to a Zotero library. \
                 Fetch and read the source with your own tools first, extract its \
                 metadata, then call save_to_zotero with a pdf_url or snapshot_url \
                 so the source document is preserved. Use list_collections to file \
                 items, search_items and recent_items to browse the library, and \
                 create_note or update_item to annotate and fix existing entries. \
                 Call zotero_help for the full workflow."
                    .into(),
            ),
        }
    }
}
