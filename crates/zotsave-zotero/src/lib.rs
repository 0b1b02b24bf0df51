pub mod client;
pub mod error;
pub mod params;
pub mod types;

pub use client::{LibraryType, ZoteroClient, DEFAULT_BASE_URL};
pub use error::{Result, ZoteroError};
pub use params::{CollectionListParams, ItemListParams};
pub use types::{
    Collection, CollectionData, Creator, Item, ItemData, ItemMeta, ListResponse,
    ParentCollection, Tag, UploadOutcome, UploadStatus, WriteFailure, WriteResponse,
};
