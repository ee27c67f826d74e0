use crate::core::models::MediaItem;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Name of the durable record holding the favorites list.
pub const FAVORITES_RECORD: &str = "favorites";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Data file corruption: {0}")]
    Corruption(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Durable backing for the favorites list. Implementations store the whole
/// ordered collection as one record; `load_all` on a missing record returns
/// an empty list.
pub trait StorageProvider {
    fn load_all(&self) -> Result<Vec<MediaItem>, StorageError>;
    fn save_all(&self, items: &[MediaItem]) -> Result<(), StorageError>;
}

/// Decodes a serialized record body. Shared by every backend so the stored
/// format is the same whichever one wrote it. A body that is not a JSON
/// array is corrupt; entries inside it that don't decode are skipped.
pub fn decode_record(body: &str) -> Result<Vec<MediaItem>, StorageError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<Value> =
        serde_json::from_str(body).map_err(|e| StorageError::Corruption(e.to_string()))?;

    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<MediaItem>(entry) {
            Ok(item) => items.push(item),
            Err(e) => warn!(index, error = %e, "Skipping unreadable stored favorite"),
        }
    }
    Ok(items)
}

pub fn encode_record(items: &[MediaItem]) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(items)?)
}
