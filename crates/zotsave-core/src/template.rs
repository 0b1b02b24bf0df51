use serde_json::{json, Map, Value};

/// User-supplied metadata for a new library item. Everything except `title`
/// is optional; which fields actually land on the item depends on what the
/// type's template declares.
#[derive(Debug, Clone, Default)]
pub struct ItemMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub date: Option<String>,
    pub url: Option<String>,
    pub abstract_text: Option<String>,
    pub publication: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
    pub extra: Option<String>,
    pub tags: Vec<String>,
    pub collection_id: Option<String>,
}

/// Fill a type-specific item template with user-supplied metadata.
///
/// The template declares which fields are valid for the item type; apart
/// from `title` (required) and `tags`, a field is only written when the
/// template already declares it. This keeps the write from carrying fields
/// the API would reject for that type.
pub fn fill_template(template: &Map<String, Value>, meta: &ItemMetadata) -> Map<String, Value> {
    let mut filled = template.clone();

    filled.insert("title".to_string(), Value::String(meta.title.clone()));

    set_if_declared(&mut filled, "date", meta.date.as_deref());
    set_if_declared(&mut filled, "url", meta.url.as_deref());
    set_if_declared(&mut filled, "abstractNote", meta.abstract_text.as_deref());
    set_if_declared(&mut filled, "extra", meta.extra.as_deref());

    // Different item types name their container differently; the first
    // declared field wins and only one is ever set.
    if let Some(publication) = non_empty(meta.publication.as_deref()) {
        for field in ["publicationTitle", "blogTitle", "websiteTitle"] {
            if filled.contains_key(field) {
                filled.insert(field.to_string(), Value::String(publication.to_string()));
                break;
            }
        }
    }

    set_if_declared(&mut filled, "volume", meta.volume.as_deref());
    set_if_declared(&mut filled, "issue", meta.issue.as_deref());
    set_if_declared(&mut filled, "pages", meta.pages.as_deref());
    set_if_declared(&mut filled, "DOI", meta.doi.as_deref());

    if !meta.authors.is_empty() && filled.contains_key("creators") {
        let creators: Vec<Value> = meta.authors.iter().map(|a| creator_from_name(a)).collect();
        filled.insert("creators".to_string(), Value::Array(creators));
    }

    // Tags are valid on every item type, so they skip the declaration gate.
    if !meta.tags.is_empty() {
        let tags: Vec<Value> = meta.tags.iter().map(|t| json!({ "tag": t })).collect();
        filled.insert("tags".to_string(), Value::Array(tags));
    }

    if let Some(collection_id) = non_empty(meta.collection_id.as_deref()) {
        filled.insert("collections".to_string(), json!([collection_id]));
    }

    filled
}

/// Sparse merge guarded by the destination schema: write `field` only when
/// the caller supplied a non-empty value AND the destination already
/// declares that field.
pub fn set_if_declared(dest: &mut Map<String, Value>, field: &str, value: Option<&str>) {
    if let Some(value) = non_empty(value) {
        if dest.contains_key(field) {
            dest.insert(field.to_string(), Value::String(value.to_string()));
        }
    }
}

/// Build a creator entry from a display name. Names with two or more
/// whitespace-separated tokens are split into first/last; single-token names
/// (organizations like "WHO") use the single-field form.
pub fn creator_from_name(name: &str) -> Value {
    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.len() >= 2 {
        json!({
            "creatorType": "author",
            "firstName": parts[..parts.len() - 1].join(" "),
            "lastName": parts[parts.len() - 1],
        })
    } else {
        json!({ "creatorType": "author", "name": name })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webpage_template() -> Map<String, Value> {
        serde_json::from_str(
            r#"{
                "itemType": "webpage",
                "title": "",
                "creators": [],
                "abstractNote": "",
                "websiteTitle": "",
                "date": "",
                "url": "",
                "extra": ""
            }"#,
        )
        .unwrap()
    }

    fn article_template() -> Map<String, Value> {
        serde_json::from_str(
            r#"{
                "itemType": "journalArticle",
                "title": "",
                "creators": [],
                "abstractNote": "",
                "publicationTitle": "",
                "volume": "",
                "issue": "",
                "pages": "",
                "date": "",
                "DOI": "",
                "url": "",
                "extra": ""
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_title_is_always_assigned() {
        let meta = ItemMetadata { title: "A Page".to_string(), ..Default::default() };
        let filled = fill_template(&webpage_template(), &meta);
        assert_eq!(filled["title"], "A Page");
    }

    #[test]
    fn test_undeclared_field_is_never_invented() {
        let meta = ItemMetadata {
            title: "A Page".to_string(),
            doi: Some("10.1000/182".to_string()),
            volume: Some("3".to_string()),
            ..Default::default()
        };
        let filled = fill_template(&webpage_template(), &meta);
        assert!(!filled.contains_key("DOI"));
        assert!(!filled.contains_key("volume"));
    }

    #[test]
    fn test_declared_fields_are_filled() {
        let meta = ItemMetadata {
            title: "Deep Results".to_string(),
            doi: Some("10.1000/182".to_string()),
            volume: Some("3".to_string()),
            issue: Some("2".to_string()),
            pages: Some("10-22".to_string()),
            abstract_text: Some("Findings.".to_string()),
            date: Some("2024-01-02".to_string()),
            ..Default::default()
        };
        let filled = fill_template(&article_template(), &meta);
        assert_eq!(filled["DOI"], "10.1000/182");
        assert_eq!(filled["volume"], "3");
        assert_eq!(filled["issue"], "2");
        assert_eq!(filled["pages"], "10-22");
        assert_eq!(filled["abstractNote"], "Findings.");
        assert_eq!(filled["date"], "2024-01-02");
    }

    #[test]
    fn test_publication_uses_first_declared_field() {
        let meta = ItemMetadata {
            title: "t".to_string(),
            publication: Some("Nature".to_string()),
            ..Default::default()
        };
        let article = fill_template(&article_template(), &meta);
        assert_eq!(article["publicationTitle"], "Nature");
        assert!(!article.contains_key("websiteTitle"));

        let webpage = fill_template(&webpage_template(), &meta);
        assert_eq!(webpage["websiteTitle"], "Nature");
        assert!(!webpage.contains_key("publicationTitle"));
    }

    #[test]
    fn test_multi_token_author_splits_first_last() {
        let creator = creator_from_name("Jane Q. Public");
        assert_eq!(creator["firstName"], "Jane Q.");
        assert_eq!(creator["lastName"], "Public");
        assert_eq!(creator["creatorType"], "author");
        assert!(creator.get("name").is_none());
    }

    #[test]
    fn test_single_token_author_uses_name_field() {
        let creator = creator_from_name("WHO");
        assert_eq!(creator["name"], "WHO");
        assert!(creator.get("firstName").is_none());
    }

    #[test]
    fn test_organization_with_spaces_still_splits() {
        // Only single-token names get the single-field form; multi-word
        // organizations are split like person names.
        let creator = creator_from_name("World Health Organization");
        assert_eq!(creator["firstName"], "World Health");
        assert_eq!(creator["lastName"], "Organization");
    }

    #[test]
    fn test_tags_skip_the_declaration_gate() {
        let mut template = Map::new();
        template.insert("itemType".to_string(), json!("document"));
        template.insert("title".to_string(), json!(""));
        let meta = ItemMetadata {
            title: "t".to_string(),
            tags: vec!["energy".to_string(), "policy".to_string()],
            ..Default::default()
        };
        let filled = fill_template(&template, &meta);
        assert_eq!(filled["tags"], json!([{"tag": "energy"}, {"tag": "policy"}]));
    }

    #[test]
    fn test_collection_becomes_single_element_list() {
        let meta = ItemMetadata {
            title: "t".to_string(),
            collection_id: Some("COLL0001".to_string()),
            ..Default::default()
        };
        let filled = fill_template(&webpage_template(), &meta);
        assert_eq!(filled["collections"], json!(["COLL0001"]));
    }

    #[test]
    fn test_empty_values_are_not_assigned() {
        let meta = ItemMetadata {
            title: "t".to_string(),
            date: Some(String::new()),
            ..Default::default()
        };
        let filled = fill_template(&webpage_template(), &meta);
        assert_eq!(filled["date"], "");
        // The template's empty placeholder is untouched, not overwritten.
        assert_eq!(filled["url"], "");
    }
}
