pub mod attach;
pub mod config;
pub mod item_type;
pub mod listing;
pub mod save;
pub mod summary;
pub mod template;
pub mod unwrap;

pub use attach::{attach_pdf_from_url, attach_snapshot, AttachError, AttachOutcome};
pub use item_type::{known_aliases, resolve_item_type};
pub use listing::{collection_items, recent_items, search_items};
pub use save::{
    save_item, update_metadata, AttachReport, SaveError, SaveOutcome, SaveRequest, UpdateOutcome,
    UpdateRequest,
};
pub use summary::{summarize, summarize_items, ItemSummary};
pub use template::{creator_from_name, fill_template, set_if_declared, ItemMetadata};
pub use unwrap::unwrap_url;
pub use zotsave_zotero::{ZoteroClient, ZoteroError};
