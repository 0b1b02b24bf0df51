use std::time::{Duration, SystemTime, UNIX_EPOCH};

use md5::{Digest, Md5};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{Map, Value};

use crate::error::{Result, ZoteroError};
use crate::params::{CollectionListParams, ItemListParams};
use crate::types::{
    Collection, Item, ListResponse, UploadAuthorization, UploadOutcome, UploadStatus,
    WriteResponse,
};

pub const DEFAULT_BASE_URL: &str = "https://api.zotero.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryType {
    User,
    Group,
}

/// Client for the Zotero Web API v3.
///
/// All requests carry `Zotero-API-Version: 3`, bearer authentication, and a
/// fixed 60-second timeout. Cloning is cheap; the underlying connection pool
/// is shared.
#[derive(Clone)]
pub struct ZoteroClient {
    http: reqwest::Client,
    base_url: String,
    library_id: String,
    library_type: LibraryType,
    api_key: String,
}

impl ZoteroClient {
    pub fn new(library_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            library_id: library_id.into(),
            library_type: LibraryType::User,
            api_key: api_key.into(),
        }
    }

    pub fn with_library_type(mut self, library_type: LibraryType) -> Self {
        self.library_type = library_type;
        self
    }

    /// Override the API base URL (used by tests against a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build a client from `ZOTERO_LIBRARY_ID` (or `ZOTERO_USER_ID`),
    /// `ZOTERO_API_KEY`, and optional `ZOTERO_LIBRARY_TYPE`.
    pub fn from_env() -> Result<Self> {
        let library_id = std::env::var("ZOTERO_LIBRARY_ID")
            .or_else(|_| std::env::var("ZOTERO_USER_ID"))
            .map_err(|_| ZoteroError::MissingCredentials)?;
        let api_key =
            std::env::var("ZOTERO_API_KEY").map_err(|_| ZoteroError::MissingCredentials)?;
        let library_type = match std::env::var("ZOTERO_LIBRARY_TYPE").as_deref() {
            Ok("group") => LibraryType::Group,
            _ => LibraryType::User,
        };
        Ok(Self::new(library_id, api_key).with_library_type(library_type))
    }

    pub fn library_id(&self) -> &str {
        &self.library_id
    }

    fn prefix(&self) -> String {
        match self.library_type {
            LibraryType::User => format!("/users/{}", self.library_id),
            LibraryType::Group => format!("/groups/{}", self.library_id),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Zotero-API-Version", "3")
            .timeout(REQUEST_TIMEOUT)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ZoteroError::Api { status: status.as_u16(), message })
    }

    // ── Templates & writes ───────────────────────────────────────────────

    /// Fetch the empty field template for a canonical item type.
    pub async fn item_template(&self, item_type: &str) -> Result<Map<String, Value>> {
        let response = self
            .request(Method::GET, "/items/new")
            .query(&[("itemType", item_type)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Create one or more items in a single write request.
    pub async fn create_items(&self, items: &[Value]) -> Result<WriteResponse> {
        let response = self
            .request(Method::POST, &format!("{}/items", self.prefix()))
            .json(items)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn get_item(&self, key: &str) -> Result<Item> {
        let response = self
            .request(Method::GET, &format!("{}/items/{key}", self.prefix()))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Apply a partial update to an item. `version` must be the item's
    /// current version; a stale version is rejected upstream with 412.
    pub async fn update_item(&self, key: &str, version: u64, data: &Map<String, Value>) -> Result<()> {
        let response = self
            .request(Method::PATCH, &format!("{}/items/{key}", self.prefix()))
            .header("If-Unmodified-Since-Version", version)
            .json(data)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Create a child note on an existing item and return the note's key.
    pub async fn create_note(&self, parent_key: &str, note_html: &str) -> Result<String> {
        let note = serde_json::json!({
            "itemType": "note",
            "parentItem": parent_key,
            "note": note_html,
        });
        let response = self.create_items(&[note]).await?;
        response
            .first_key()
            .ok_or_else(|| ZoteroError::WriteFailed(response.failure_message()))
    }

    // ── Lists ────────────────────────────────────────────────────────────

    pub async fn list_items(&self, params: &ItemListParams) -> Result<ListResponse<Item>> {
        self.list_items_at(&format!("{}/items", self.prefix()), params).await
    }

    /// Top-level items only (children like attachments and notes are not
    /// returned as rows, though child-typed items can still be selected via
    /// `item_type`).
    pub async fn list_top_items(&self, params: &ItemListParams) -> Result<ListResponse<Item>> {
        self.list_items_at(&format!("{}/items/top", self.prefix()), params).await
    }

    pub async fn list_collection_top_items(
        &self,
        collection_key: &str,
        params: &ItemListParams,
    ) -> Result<ListResponse<Item>> {
        self.list_items_at(
            &format!("{}/collections/{collection_key}/items/top", self.prefix()),
            params,
        )
        .await
    }

    async fn list_items_at(&self, path: &str, params: &ItemListParams) -> Result<ListResponse<Item>> {
        let response = self
            .request(Method::GET, path)
            .query(&params.to_query())
            .send()
            .await?;
        let response = Self::check(response).await?;
        let total_results = total_results(response.headers());
        Ok(ListResponse { total_results, items: response.json().await? })
    }

    pub async fn list_collections(
        &self,
        params: &CollectionListParams,
    ) -> Result<ListResponse<Collection>> {
        let response = self
            .request(Method::GET, &format!("{}/collections", self.prefix()))
            .query(&params.to_query())
            .send()
            .await?;
        let response = Self::check(response).await?;
        let total_results = total_results(response.headers());
        Ok(ListResponse { total_results, items: response.json().await? })
    }

    pub async fn get_collection(&self, key: &str) -> Result<Collection> {
        let response = self
            .request(Method::GET, &format!("{}/collections/{key}", self.prefix()))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Identity and permissions for the current API key. Used to validate
    /// credentials during setup.
    pub async fn get_key_info(&self) -> Result<Value> {
        let response = self.request(Method::GET, "/keys/current").send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    // ── File upload ──────────────────────────────────────────────────────

    /// Attach a file to an existing item using the three-step upload
    /// protocol: create the attachment item, request upload authorization,
    /// then send the payload and register it. If storage already has a file
    /// with the same hash the payload is skipped entirely.
    pub async fn upload_attachment(
        &self,
        parent_key: &str,
        content: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<UploadOutcome> {
        let md5_hex = md5_hex(content);
        let mtime = unix_millis();

        let attachment = serde_json::json!({
            "itemType": "attachment",
            "parentItem": parent_key,
            "linkMode": "imported_file",
            "title": filename,
            "contentType": content_type,
            "filename": filename,
        });
        let response = self.create_items(&[attachment]).await?;
        let attachment_key = response
            .first_key()
            .ok_or_else(|| ZoteroError::WriteFailed(response.failure_message()))?;

        let file_path = format!("{}/items/{attachment_key}/file", self.prefix());
        let filesize = content.len().to_string();
        let mtime_str = mtime.to_string();
        let auth_form = [
            ("md5", md5_hex.as_str()),
            ("filename", filename),
            ("filesize", filesize.as_str()),
            ("mtime", mtime_str.as_str()),
        ];
        let response = self
            .request(Method::POST, &file_path)
            .header("If-None-Match", "*")
            .form(&auth_form)
            .send()
            .await?;
        let auth: UploadAuthorization = Self::check(response).await?.json().await?;

        if auth.exists.unwrap_or(0) == 1 {
            return Ok(UploadOutcome { attachment_key, status: UploadStatus::Exists });
        }
        let (Some(upload_url), Some(upload_key)) = (auth.url.as_deref(), auth.upload_key.as_deref())
        else {
            return Err(ZoteroError::Upload(
                "authorization response missing upload URL or key".to_string(),
            ));
        };

        // The storage endpoint expects prefix + content + suffix as one body,
        // with no Zotero auth headers.
        let prefix_bytes = auth.prefix.as_deref().unwrap_or("").as_bytes();
        let suffix_bytes = auth.suffix.as_deref().unwrap_or("").as_bytes();
        let mut body = Vec::with_capacity(prefix_bytes.len() + content.len() + suffix_bytes.len());
        body.extend_from_slice(prefix_bytes);
        body.extend_from_slice(content);
        body.extend_from_slice(suffix_bytes);
        let upload_response = self
            .http
            .post(upload_url)
            .header(CONTENT_TYPE, auth.content_type.as_deref().unwrap_or(content_type))
            .body(body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if !upload_response.status().is_success() {
            return Err(ZoteroError::Upload(format!(
                "storage upload failed with status {}",
                upload_response.status()
            )));
        }

        let response = self
            .request(Method::POST, &file_path)
            .header("If-None-Match", "*")
            .form(&[("upload", upload_key)])
            .send()
            .await?;
        Self::check(response).await?;

        Ok(UploadOutcome { attachment_key, status: UploadStatus::Uploaded })
    }
}

fn total_results(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("Total-Results")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

fn md5_hex(content: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_hex() {
        // RFC 1321 test vector
        assert_eq!(md5_hex(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_library_prefix() {
        let user = ZoteroClient::new("12345", "k");
        assert_eq!(user.prefix(), "/users/12345");
        let group = ZoteroClient::new("99", "k").with_library_type(LibraryType::Group);
        assert_eq!(group.prefix(), "/groups/99");
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_reads_credentials() {
        unsafe {
            std::env::set_var("ZOTERO_LIBRARY_ID", "424242");
            std::env::set_var("ZOTERO_API_KEY", "secret");
            std::env::set_var("ZOTERO_LIBRARY_TYPE", "group");
        }
        let client = ZoteroClient::from_env().unwrap();
        assert_eq!(client.library_id(), "424242");
        assert_eq!(client.prefix(), "/groups/424242");
        unsafe {
            std::env::remove_var("ZOTERO_LIBRARY_ID");
            std::env::remove_var("ZOTERO_API_KEY");
            std::env::remove_var("ZOTERO_LIBRARY_TYPE");
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_missing_credentials() {
        unsafe {
            std::env::remove_var("ZOTERO_LIBRARY_ID");
            std::env::remove_var("ZOTERO_USER_ID");
            std::env::remove_var("ZOTERO_API_KEY");
        }
        assert!(matches!(ZoteroClient::from_env(), Err(ZoteroError::MissingCredentials)));
    }
}
