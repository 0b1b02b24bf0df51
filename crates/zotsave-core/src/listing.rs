use zotsave_zotero::{ItemListParams, ZoteroClient, ZoteroError};

use crate::summary::{summarize_items, ItemSummary};

/// Quick search over top-level items. `everything` expands the search from
/// title/creator/year to all fields and full-text content.
pub async fn search_items(
    client: &ZoteroClient,
    query: &str,
    everything: bool,
    limit: Option<u32>,
    start: Option<u32>,
) -> Result<Vec<ItemSummary>, ZoteroError> {
    let params = ItemListParams {
        q: Some(query.to_string()),
        qmode: everything.then(|| "everything".to_string()),
        limit,
        start,
        ..Default::default()
    };
    let response = client.list_top_items(&params).await?;
    Ok(summarize_items(&response.items))
}

/// Top-level items of a collection.
pub async fn collection_items(
    client: &ZoteroClient,
    collection_key: &str,
    limit: Option<u32>,
    start: Option<u32>,
) -> Result<Vec<ItemSummary>, ZoteroError> {
    let params = ItemListParams { limit, start, ..Default::default() };
    let response = client.list_collection_top_items(collection_key, &params).await?;
    Ok(summarize_items(&response.items))
}

/// Most recently added top-level items.
pub async fn recent_items(
    client: &ZoteroClient,
    limit: Option<u32>,
) -> Result<Vec<ItemSummary>, ZoteroError> {
    let params = ItemListParams::builder()
        .sort("dateAdded")
        .direction("desc")
        .maybe_limit(limit)
        .build();
    let response = client.list_top_items(&params).await?;
    Ok(summarize_items(&response.items))
}
