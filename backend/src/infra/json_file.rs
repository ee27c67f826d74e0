use crate::core::models::MediaItem;
use crate::core::storage::{decode_record, encode_record, StorageError, StorageProvider};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Favorites kept as one JSON document on disk. Writes go to a temp file in
/// the same directory and are renamed over the target, so a crash mid-write
/// leaves the previous list intact.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl StorageProvider for JsonFileStorage {
    fn load_all(&self) -> Result<Vec<MediaItem>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(body) => decode_record(&body),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn save_all(&self, items: &[MediaItem]) -> Result<(), StorageError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let body = encode_record(items)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::favorites::FavoritesStore;
    use crate::core::models::MediaType;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("favorites.json"));
        assert!(storage.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_dirs_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested/data/favorites.json"));
        let mut item = MediaItem::new(550, MediaType::Movie, "Fight Club");
        item.vote_average = Some(8.4);
        item.overview = Some("An insomniac office worker...".into());
        let items = vec![item, MediaItem::new(1399, MediaType::Tv, "Game of Thrones")];

        storage.save_all(&items).unwrap();
        assert_eq!(storage.load_all().unwrap(), items);
    }

    #[test]
    fn test_corrupt_file_is_an_error_but_store_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, "[{\"id\": 5, \"mediaType\": \"mov").unwrap();

        let storage = JsonFileStorage::new(&path);
        assert!(matches!(storage.load_all(), Err(StorageError::Corruption(_))));

        let store = FavoritesStore::open(storage);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");

        {
            let mut store = FavoritesStore::open(JsonFileStorage::new(&path));
            store.add(MediaItem::new(1, MediaType::Movie, "A")).unwrap();
            store.add(MediaItem::new(2, MediaType::Movie, "B")).unwrap();
            store.remove(1, MediaType::Movie);
            store.add(MediaItem::new(1, MediaType::Movie, "A")).unwrap();
        }

        let store = FavoritesStore::open(JsonFileStorage::new(&path));
        let ids: Vec<u32> = store.list().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(store.is_durable());
    }

    #[test]
    fn test_unwritable_target_degrades_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the final rename fail.
        let path = dir.path().join("favorites.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();

        let mut store = FavoritesStore::open(JsonFileStorage::new(&path));
        assert!(store.add(MediaItem::new(9, MediaType::Tv, "Nine")).unwrap());
        assert!(store.is_favorite(9, MediaType::Tv));
        assert!(!store.is_durable());
    }
}
