use std::sync::mpsc;
use std::thread;

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::core::favorites::{FavoritesEvent, FavoritesStore};
use crate::core::models::{MediaItem, MediaKey, ValidationError};
use crate::core::storage::{StorageError, StorageProvider};

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Favorites worker is not running")]
    Stopped,

    #[error("Failed to start favorites worker: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    pub count: usize,
    pub durable: bool,
}

/// Backend the worker runs on. When the configured storage cannot be
/// opened the store still serves an in-memory list; nothing it holds
/// survives a restart.
enum WorkerStorage<S> {
    Open(S),
    Unavailable(String),
}

impl<S> WorkerStorage<S> {
    fn is_available(&self) -> bool {
        matches!(self, WorkerStorage::Open(_))
    }
}

impl<S: StorageProvider> StorageProvider for WorkerStorage<S> {
    fn load_all(&self) -> Result<Vec<MediaItem>, StorageError> {
        match self {
            WorkerStorage::Open(storage) => storage.load_all(),
            WorkerStorage::Unavailable(_) => Ok(Vec::new()),
        }
    }

    fn save_all(&self, items: &[MediaItem]) -> Result<(), StorageError> {
        match self {
            WorkerStorage::Open(storage) => storage.save_all(items),
            WorkerStorage::Unavailable(reason) => Err(StorageError::Database(format!(
                "storage unavailable: {reason}"
            ))),
        }
    }
}

enum Command {
    List(oneshot::Sender<Vec<MediaItem>>),
    Contains(MediaKey, oneshot::Sender<bool>),
    Add(MediaItem, oneshot::Sender<Result<bool, ValidationError>>),
    Toggle(MediaItem, oneshot::Sender<Result<bool, ValidationError>>),
    Remove(MediaKey, oneshot::Sender<bool>),
    Status(oneshot::Sender<StoreStatus>),
}

/// Async front for a [`FavoritesStore`] owned by one dedicated thread.
/// Commands are applied strictly in arrival order, each one
/// (including its write to storage) before the next starts.
#[derive(Clone)]
pub struct FavoritesHandle {
    tx: mpsc::Sender<Command>,
}

impl FavoritesHandle {
    /// Starts the worker. `open` runs on the worker thread, so storage that
    /// owns a runtime is created and dropped outside async code. Returns once
    /// the store is ready. A storage that fails to open leaves the store
    /// running in memory only, reported as not durable.
    pub fn spawn<S, F>(open: F) -> Result<Self, WorkerError>
    where
        S: StorageProvider,
        F: FnOnce() -> Result<S, StorageError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("favorites".into())
            .spawn(move || {
                let storage = match open() {
                    Ok(s) => WorkerStorage::Open(s),
                    Err(e) => {
                        warn!(error = %e, "Favorites storage unavailable, keeping favorites in memory only");
                        WorkerStorage::Unavailable(e.to_string())
                    }
                };
                let available = storage.is_available();

                let mut store = FavoritesStore::open(storage);
                store.subscribe(|event| match event {
                    FavoritesEvent::Added(item) => debug!(key = %item.key(), title = %item.title, "Favorite added"),
                    FavoritesEvent::Removed(key) => debug!(%key, "Favorite removed"),
                });
                info!(count = store.len(), durable = available, "Favorites store ready");
                let _ = ready_tx.send(());

                for command in rx {
                    apply(&mut store, available, command);
                }
                debug!("Favorites worker stopped");
            })?;

        match ready_rx.recv() {
            Ok(()) => Ok(Self { tx }),
            Err(_) => Err(WorkerError::Stopped),
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, WorkerError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(command(reply))
            .map_err(|_| WorkerError::Stopped)?;
        response.await.map_err(|_| WorkerError::Stopped)
    }

    pub async fn list(&self) -> Result<Vec<MediaItem>, WorkerError> {
        self.request(Command::List).await
    }

    pub async fn is_favorite(&self, key: MediaKey) -> Result<bool, WorkerError> {
        self.request(|reply| Command::Contains(key, reply)).await
    }

    pub async fn add(&self, item: MediaItem) -> Result<Result<bool, ValidationError>, WorkerError> {
        self.request(|reply| Command::Add(item, reply)).await
    }

    pub async fn toggle(
        &self,
        item: MediaItem,
    ) -> Result<Result<bool, ValidationError>, WorkerError> {
        self.request(|reply| Command::Toggle(item, reply)).await
    }

    pub async fn remove(&self, key: MediaKey) -> Result<bool, WorkerError> {
        self.request(|reply| Command::Remove(key, reply)).await
    }

    pub async fn status(&self) -> Result<StoreStatus, WorkerError> {
        self.request(Command::Status).await
    }
}

fn apply<S: StorageProvider>(store: &mut FavoritesStore<S>, available: bool, command: Command) {
    // A dropped receiver means the caller went away; the mutation still stands.
    match command {
        Command::List(reply) => {
            let _ = reply.send(store.list());
        }
        Command::Contains(key, reply) => {
            let _ = reply.send(store.is_favorite(key.id, key.media_type));
        }
        Command::Add(item, reply) => {
            let _ = reply.send(store.add(item));
        }
        Command::Toggle(item, reply) => {
            let _ = reply.send(store.toggle(item));
        }
        Command::Remove(key, reply) => {
            let _ = reply.send(store.remove(key.id, key.media_type));
        }
        Command::Status(reply) => {
            let _ = reply.send(StoreStatus {
                count: store.len(),
                durable: available && store.is_durable(),
            });
        }
    }
}
