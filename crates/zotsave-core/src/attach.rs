use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::HeaderMap;
use serde::Serialize;
use zotsave_zotero::{UploadStatus, ZoteroClient, ZoteroError};

use crate::unwrap::unwrap_url;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const DOWNLOAD_USER_AGENT: &str = "Mozilla/5.0 (compatible; zotsave/0.1)";

static DOWNLOAD_HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static UNSAFE_FILENAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-.]").unwrap());

#[derive(thiserror::Error, Debug)]
pub enum AttachError {
    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("download of {url} returned status {status}")]
    DownloadStatus { url: String, status: u16 },
    #[error(transparent)]
    Zotero(#[from] ZoteroError),
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachOutcome {
    pub filename: String,
    pub size_bytes: u64,
    pub attachment_key: String,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Download a PDF and attach it to an existing item. Wrapper/proxy URLs are
/// unwrapped first so the stored file is the source document, not the
/// wrapper's rendering page.
pub async fn attach_pdf_from_url(
    client: &ZoteroClient,
    parent_key: &str,
    pdf_url: &str,
    filename: Option<&str>,
) -> Result<AttachOutcome, AttachError> {
    let target = unwrap_url(pdf_url);
    if target != pdf_url {
        tracing::debug!(outer = pdf_url, inner = %target, "unwrapped proxy URL");
    }

    let response = download(&target).await?;
    let header_filename = content_disposition_filename(response.headers());
    let bytes = response
        .bytes()
        .await
        .map_err(|source| AttachError::Download { url: target.clone(), source })?;

    let filename = match filename {
        Some(name) => name.to_string(),
        None => header_filename.unwrap_or_else(|| pdf_filename_from_url(&target)),
    };

    let upload = client
        .upload_attachment(parent_key, &bytes, &filename, "application/pdf")
        .await?;
    Ok(AttachOutcome {
        filename,
        size_bytes: bytes.len() as u64,
        attachment_key: upload.attachment_key,
        status: upload.status,
        title: None,
    })
}

/// Fetch a webpage and attach it as an HTML snapshot. Web content changes or
/// disappears; the snapshot preserves what was actually cited.
pub async fn attach_snapshot(
    client: &ZoteroClient,
    parent_key: &str,
    url: &str,
    title: Option<&str>,
) -> Result<AttachOutcome, AttachError> {
    let target = unwrap_url(url);

    let response = download(&target).await?;
    let html = response
        .text()
        .await
        .map_err(|source| AttachError::Download { url: target.clone(), source })?;

    let title = match title {
        Some(title) => title.to_string(),
        None => page_title(&html).unwrap_or_else(|| target.clone()),
    };
    let filename = format!("{}.html", snapshot_basename(&title));

    let bytes = html.into_bytes();
    let upload = client
        .upload_attachment(parent_key, &bytes, &filename, "text/html")
        .await?;
    Ok(AttachOutcome {
        filename,
        size_bytes: bytes.len() as u64,
        attachment_key: upload.attachment_key,
        status: upload.status,
        title: Some(title),
    })
}

async fn download(url: &str) -> Result<reqwest::Response, AttachError> {
    let response = DOWNLOAD_HTTP
        .get(url)
        .header("User-Agent", DOWNLOAD_USER_AGENT)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .map_err(|source| AttachError::Download { url: url.to_string(), source })?;
    let status = response.status();
    if !status.is_success() {
        return Err(AttachError::DownloadStatus { url: url.to_string(), status: status.as_u16() });
    }
    Ok(response)
}

fn content_disposition_filename(headers: &HeaderMap) -> Option<String> {
    let disposition = headers.get("Content-Disposition")?.to_str().ok()?;
    let name = disposition.rsplit("filename=").next()?;
    if name == disposition {
        return None;
    }
    let name = name.trim().trim_matches(['"', '\'']);
    (!name.is_empty()).then(|| name.to_string())
}

/// Derive a filename from the last path segment, falling back to a generic
/// name when it doesn't look like a PDF.
fn pdf_filename_from_url(url: &str) -> String {
    let name = url
        .rsplit('/')
        .next()
        .and_then(|segment| segment.split('?').next())
        .unwrap_or_default();
    if name.ends_with(".pdf") {
        name.to_string()
    } else {
        "attachment.pdf".to_string()
    }
}

fn page_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Reduce a page title to a storage-safe basename: strip unsafe characters,
/// cap at 80 characters, fall back to "snapshot".
fn snapshot_basename(title: &str) -> String {
    let safe: String = UNSAFE_FILENAME_RE
        .replace_all(title, "")
        .chars()
        .take(80)
        .collect();
    let safe = safe.trim();
    if safe.is_empty() { "snapshot".to_string() } else { safe.to_string() }
}
