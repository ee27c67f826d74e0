use crate::core::models::MediaItem;
use crate::core::storage::{
    decode_record, encode_record, StorageError, StorageProvider, FAVORITES_RECORD,
};
use libsql::{Builder, Connection};
use tokio::runtime::Runtime;

// ═══════════════════════════════════════════════════════════════
// Database: async access to named records.
// ═══════════════════════════════════════════════════════════════

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Connect to a local SQLite file (async).
    pub async fn local(path: &str) -> Result<Self, StorageError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(StorageError::Io)?;
        }
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let conn = db
            .connect()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let storage = Self { conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Connect to a remote Turso database (async).
    pub async fn turso(url: &str, token: &str) -> Result<Self, StorageError> {
        let db = Builder::new_remote(url.to_string(), token.to_string())
            .build()
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let conn = db
            .connect()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let storage = Self { conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    async fn run_migrations(&self) -> Result<(), StorageError> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS records (
                    name       TEXT PRIMARY KEY,
                    body       TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                (),
            )
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn load_record(&self, name: &str) -> Result<Option<String>, StorageError> {
        let mut rows = self
            .conn
            .query(
                "SELECT body FROM records WHERE name = ?1",
                libsql::params![name],
            )
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        match rows
            .next()
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?
        {
            Some(row) => {
                let body: String = row
                    .get(0)
                    .map_err(|e| StorageError::Corruption(e.to_string()))?;
                Ok(Some(body))
            }
            None => Ok(None),
        }
    }

    pub async fn save_record(&self, name: &str, body: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO records (name, body, updated_at)
                 VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(name) DO UPDATE SET
                    body = excluded.body,
                    updated_at = excluded.updated_at",
                libsql::params![name, body],
            )
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
// SqlStorage: sync wrapper for the favorites store.  Owns a tokio
// Runtime, so it must be created and dropped outside async code.
// ═══════════════════════════════════════════════════════════════

pub struct SqlStorage {
    db: Database,
    rt: Runtime,
}

impl SqlStorage {
    pub fn local(path: &str) -> Result<Self, StorageError> {
        let rt = Runtime::new().map_err(|e| StorageError::Database(e.to_string()))?;
        let db = rt.block_on(Database::local(path))?;
        Ok(Self { db, rt })
    }

    pub fn turso(url: &str, token: &str) -> Result<Self, StorageError> {
        let rt = Runtime::new().map_err(|e| StorageError::Database(e.to_string()))?;
        let db = rt.block_on(Database::turso(url, token))?;
        Ok(Self { db, rt })
    }
}

impl StorageProvider for SqlStorage {
    fn load_all(&self) -> Result<Vec<MediaItem>, StorageError> {
        match self.rt.block_on(self.db.load_record(FAVORITES_RECORD))? {
            Some(body) => decode_record(&body),
            None => Ok(Vec::new()),
        }
    }

    fn save_all(&self, items: &[MediaItem]) -> Result<(), StorageError> {
        let body = encode_record(items)?;
        self.rt.block_on(self.db.save_record(FAVORITES_RECORD, &body))
    }
}
