/// Short, human-friendly aliases mapped to Zotero's canonical item types.
const ITEM_TYPE_ALIASES: &[(&str, &str)] = &[
    ("article", "journalArticle"),
    ("journal", "journalArticle"),
    ("book", "book"),
    ("chapter", "bookSection"),
    ("conference", "conferencePaper"),
    ("thesis", "thesis"),
    ("report", "report"),
    ("webpage", "webpage"),
    ("blog", "blogPost"),
    ("news", "newspaperArticle"),
    ("magazine", "magazineArticle"),
    ("document", "document"),
    ("legal", "statute"),
    ("case", "case"),
    ("patent", "patent"),
    ("video", "videoRecording"),
    ("podcast", "podcast"),
    ("presentation", "presentation"),
];

/// Resolve an item-type alias to the canonical Zotero type. Lookup is
/// case-insensitive; unknown inputs pass through unchanged, so callers can
/// also use canonical type names directly (the API validates them).
pub fn resolve_item_type(alias: &str) -> String {
    let lower = alias.to_lowercase();
    ITEM_TYPE_ALIASES
        .iter()
        .find(|(short, _)| *short == lower)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or_else(|| alias.to_string())
}

/// The alias vocabulary, for the `zotero_item_types` tool.
pub fn known_aliases() -> Vec<&'static str> {
    ITEM_TYPE_ALIASES.iter().map(|(short, _)| *short).collect()
}
