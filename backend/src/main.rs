mod core;
mod infra;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::core::catalog::CatalogGateway;
use infra::config::{AppConfig, StorageMode};
use infra::database::SqlStorage;
use infra::favorites_worker::{FavoritesHandle, WorkerError};
use infra::json_file::JsonFileStorage;
use infra::tmdb::TmdbClient;
use infra::web::AppState;

fn main() {
    // Load .env if present; production uses real env vars
    let _ = dotenvy::dotenv();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };
    infra::logging::init_logging(&config.log_format);

    if let Err(e) = run(config) {
        error!(error = %e, "flix stopped");
        std::process::exit(1);
    }
}

fn spawn_favorites(storage: StorageMode) -> Result<FavoritesHandle, WorkerError> {
    match storage {
        StorageMode::File { path } => {
            info!(path = %path.display(), "Favorites stored in JSON file");
            FavoritesHandle::spawn(move || Ok(JsonFileStorage::new(path)))
        }
        StorageMode::Local { path } => {
            info!(%path, "Favorites stored in local database");
            FavoritesHandle::spawn(move || SqlStorage::local(&path))
        }
        StorageMode::Turso { url, token } => {
            info!(%url, "Favorites stored in Turso");
            FavoritesHandle::spawn(move || SqlStorage::turso(&url, &token))
        }
    }
}

fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Build the blocking catalog client and the store worker BEFORE entering
    // the async runtime; both own runtimes of their own.
    let catalog: Option<Arc<dyn CatalogGateway>> = match config
        .tmdb_api_key
        .as_deref()
        .and_then(|key| TmdbClient::new(key, &config.tmdb_base_url))
    {
        Some(client) => Some(Arc::new(client)),
        None => {
            warn!("TMDB_API_KEY not set, catalog routes disabled");
            None
        }
    };

    let favorites = spawn_favorites(config.storage)?;
    let state = AppState { favorites, catalog };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(infra::web::start_server(state, config.port))?;
    Ok(())
}
