use serde::Serialize;
use zotsave_zotero::{Creator, Item};

/// Item types that are children of a bibliographic entry rather than
/// top-level library entries.
const CHILD_ITEM_TYPES: [&str; 2] = ["attachment", "note"];

/// Compact, assistant-friendly view of a library item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemSummary {
    pub key: String,
    pub title: String,
    #[serde(rename = "itemType")]
    pub item_type: String,
    pub creators: Option<String>,
    pub date: Option<String>,
    pub tags: Vec<String>,
    pub url: Option<String>,
}

/// Reduce a full item to its summary. Missing fields get explicit defaults:
/// `(untitled)` for the title, `null` for creators/date/url.
pub fn summarize(item: &Item) -> ItemSummary {
    let joined = item
        .data
        .creators
        .iter()
        .map(creator_display)
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join("; ");
    ItemSummary {
        key: item.key.clone(),
        title: item
            .data
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "(untitled)".to_string()),
        item_type: item.data.item_type.clone(),
        creators: if joined.is_empty() { None } else { Some(joined) },
        date: item.data.date.clone(),
        tags: item.data.tags.iter().map(|t| t.name().to_string()).collect(),
        url: item.data.url.clone(),
    }
}

/// Summarize a listing, dropping attachment and note rows first; those are
/// children, not library entries.
pub fn summarize_items(items: &[Item]) -> Vec<ItemSummary> {
    items
        .iter()
        .filter(|item| !CHILD_ITEM_TYPES.contains(&item.data.item_type.as_str()))
        .map(summarize)
        .collect()
}

fn creator_display(creator: &Creator) -> String {
    match creator.name.as_deref() {
        Some(name) => name.to_string(),
        None => {
            let first = creator.first_name.as_deref().unwrap_or("");
            let last = creator.last_name.as_deref().unwrap_or("");
            format!("{first} {last}").trim().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: serde_json::Value) -> Item {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_summarize_full_item() {
        let item = item(json!({
            "key": "AAAA0001",
            "version": 4,
            "data": {
                "itemType": "journalArticle",
                "title": "Grid Storage",
                "date": "2024",
                "url": "https://example.com/grid",
                "creators": [
                    {"creatorType": "author", "firstName": "Jane", "lastName": "Public"},
                    {"creatorType": "author", "name": "IEA"}
                ],
                "tags": [{"tag": "energy"}, "storage"]
            }
        }));
        let summary = summarize(&item);
        assert_eq!(summary.title, "Grid Storage");
        assert_eq!(summary.creators.as_deref(), Some("Jane Public; IEA"));
        assert_eq!(summary.tags, vec!["energy", "storage"]);
        assert_eq!(summary.date.as_deref(), Some("2024"));
    }

    #[test]
    fn test_missing_title_defaults_to_untitled() {
        let item = item(json!({
            "key": "AAAA0002",
            "data": {"itemType": "webpage"}
        }));
        let summary = summarize(&item);
        assert_eq!(summary.title, "(untitled)");
        assert!(summary.date.is_none());
        assert!(summary.url.is_none());
    }

    #[test]
    fn test_empty_creator_names_collapse_to_null() {
        let item = item(json!({
            "key": "AAAA0003",
            "data": {
                "itemType": "report",
                "creators": [{"creatorType": "author", "firstName": "", "lastName": ""}]
            }
        }));
        let summary = summarize(&item);
        assert!(summary.creators.is_none());
        // Serializes as null, never the empty string.
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value["creators"].is_null());
    }

    #[test]
    fn test_partial_creator_name_is_trimmed() {
        let item = item(json!({
            "key": "AAAA0004",
            "data": {
                "itemType": "report",
                "creators": [{"creatorType": "author", "lastName": "Curie"}]
            }
        }));
        assert_eq!(summarize(&item).creators.as_deref(), Some("Curie"));
    }

    #[test]
    fn test_listing_filters_attachments_and_notes() {
        let items: Vec<Item> = vec![
            item(json!({"key": "A", "data": {"itemType": "journalArticle", "title": "Keep"}})),
            item(json!({"key": "B", "data": {"itemType": "attachment", "title": "drop.pdf"}})),
            item(json!({"key": "C", "data": {"itemType": "note"}})),
            item(json!({"key": "D", "data": {"itemType": "webpage", "title": "Also keep"}})),
        ];
        let summaries = summarize_items(&items);
        let keys: Vec<&str> = summaries.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "D"]);
    }
}
