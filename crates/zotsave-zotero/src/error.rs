#[derive(thiserror::Error, Debug)]
pub enum ZoteroError {
    #[error(
        "Zotero is not configured: set ZOTERO_LIBRARY_ID and ZOTERO_API_KEY \
         (get credentials from https://www.zotero.org/settings/keys)"
    )]
    MissingCredentials,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Zotero API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("write rejected by Zotero: {0}")]
    WriteFailed(String),
    #[error("file upload failed: {0}")]
    Upload(String),
}

pub type Result<T> = std::result::Result<T, ZoteroError>;
