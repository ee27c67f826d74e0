use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::api_types::{
    api_items, ApiDetail, ApiError, ApiFavoriteInput, ApiFavorites, ApiHealth, ApiMembership,
    ApiPage,
};
use crate::core::browse::{self, Page};
use crate::core::catalog::{
    CatalogGateway, CatalogRequest, CatalogResponse, Category, NetworkError, SearchScope,
    TimeWindow,
};
use crate::core::models::{MediaKey, MediaType, ValidationError};
use crate::infra::favorites_worker::{FavoritesHandle, WorkerError};

// ── App state ────────────────────────────────────────────────

/// Shared by every handler. The favorites store lives behind its worker;
/// the catalog is optional so the app still serves My List without a key.
#[derive(Clone)]
pub struct AppState {
    pub favorites: FavoritesHandle,
    pub catalog: Option<Arc<dyn CatalogGateway>>,
}

// ── Server bootstrap ─────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/favorites", get(list_favorites).post(add_favorite))
        .route("/api/favorites/toggle", post(toggle_favorite))
        .route(
            "/api/favorites/{media_type}/{id}",
            get(get_favorite).delete(remove_favorite),
        )
        .route("/api/pages/{page}", get(get_page))
        .route("/api/catalog/{media_type}/{category}", get(get_category))
        .route("/api/trending/{media_type}", get(get_trending))
        .route("/api/genres/{media_type}", get(get_genres))
        .route("/api/discover/{media_type}", get(discover))
        .route("/api/details/{media_type}/{id}", get(get_details))
        .route("/api/search", get(search))
        .route("/api/health", get(health))
        .with_state(state)
        // The browser front end is served from a different origin.
        .layer(tower_http::cors::CorsLayer::permissive())
}

pub async fn start_server(state: AppState, port: u16) -> std::io::Result<()> {
    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "flix API listening on http://localhost:{port}/api");
    axum::serve(listener, app).await
}

// ── Error mapping ────────────────────────────────────────────

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiError { error: message.into() })).into_response()
}

fn network_error(e: NetworkError) -> Response {
    warn!(error = %e, "Catalog request failed");
    match e {
        NetworkError::NotFound => error_response(StatusCode::NOT_FOUND, e.to_string()),
        _ => error_response(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

fn worker_error(e: WorkerError) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn validation_error(e: ValidationError) -> Response {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
}

fn parse_media_type(s: &str) -> Result<MediaType, Response> {
    s.parse()
        .map_err(|e: ValidationError| error_response(StatusCode::BAD_REQUEST, e.to_string()))
}

fn require_catalog(state: &AppState) -> Result<Arc<dyn CatalogGateway>, Response> {
    state.catalog.clone().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Catalog is not configured (TMDB_API_KEY is not set)",
        )
    })
}

// ── Catalog access ───────────────────────────────────────────

/// Runs a blocking catalog call on the blocking pool.
async fn fetch(
    catalog: Arc<dyn CatalogGateway>,
    request: CatalogRequest,
) -> Result<CatalogResponse, NetworkError> {
    tokio::task::spawn_blocking(move || catalog.fetch(&request))
        .await
        .unwrap_or_else(|e| Err(NetworkError::Unreachable(format!("catalog task failed: {e}"))))
}

async fn fetch_items(state: &AppState, request: CatalogRequest) -> Response {
    let catalog = match require_catalog(state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match fetch(catalog, request).await.and_then(CatalogResponse::into_items) {
        Ok(items) => Json(api_items(&items)).into_response(),
        Err(e) => network_error(e),
    }
}

// ── /api/favorites ───────────────────────────────────────────

async fn list_favorites(State(state): State<AppState>) -> Response {
    match state.favorites.list().await {
        Ok(items) => Json(ApiFavorites::from_items(&items)).into_response(),
        Err(e) => worker_error(e),
    }
}

async fn add_favorite(
    State(state): State<AppState>,
    Json(payload): Json<ApiFavoriteInput>,
) -> Response {
    let item = match payload.into_media_item() {
        Ok(item) => item,
        Err(e) => return validation_error(e),
    };

    match state.favorites.add(item).await {
        Ok(Ok(true)) => (StatusCode::CREATED, Json(ApiMembership { favorite: true })).into_response(),
        Ok(Ok(false)) => Json(ApiMembership { favorite: true }).into_response(),
        Ok(Err(e)) => validation_error(e),
        Err(e) => worker_error(e),
    }
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Json(payload): Json<ApiFavoriteInput>,
) -> Response {
    let item = match payload.into_media_item() {
        Ok(item) => item,
        Err(e) => return validation_error(e),
    };

    match state.favorites.toggle(item).await {
        Ok(Ok(favorite)) => Json(ApiMembership { favorite }).into_response(),
        Ok(Err(e)) => validation_error(e),
        Err(e) => worker_error(e),
    }
}

async fn get_favorite(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, u32)>,
) -> Response {
    let media_type = match parse_media_type(&media_type) {
        Ok(mt) => mt,
        Err(resp) => return resp,
    };
    match state.favorites.is_favorite(MediaKey::new(id, media_type)).await {
        Ok(favorite) => Json(ApiMembership { favorite }).into_response(),
        Err(e) => worker_error(e),
    }
}

async fn remove_favorite(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, u32)>,
) -> Response {
    let media_type = match parse_media_type(&media_type) {
        Ok(mt) => mt,
        Err(resp) => return resp,
    };
    match state.favorites.remove(MediaKey::new(id, media_type)).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => worker_error(e),
    }
}

// ── GET /api/pages/{page} ────────────────────────────────────

async fn get_page(State(state): State<AppState>, Path(page): Path<String>) -> Response {
    let Some(page) = Page::parse(&page) else {
        return error_response(StatusCode::NOT_FOUND, format!("Unknown page: {page}"));
    };
    let catalog = match require_catalog(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    // Rows load in parallel; the page is assembled once all have settled.
    let pending: Vec<_> = browse::requests(&browse::layout(page))
        .into_iter()
        .map(|request| {
            let catalog = Arc::clone(&catalog);
            let task = tokio::spawn(fetch(catalog, request.clone()));
            (request, task)
        })
        .collect();

    let mut fetched = HashMap::with_capacity(pending.len());
    for (request, task) in pending {
        let result = task
            .await
            .unwrap_or_else(|e| Err(NetworkError::Unreachable(format!("catalog task failed: {e}"))))
            .and_then(CatalogResponse::into_items);
        fetched.insert(request, result);
    }

    match browse::assemble(page, &fetched) {
        Ok(content) => Json(ApiPage::from(&content)).into_response(),
        Err(e) => network_error(e),
    }
}

// ── Catalog lists ────────────────────────────────────────────

async fn get_category(
    State(state): State<AppState>,
    Path((media_type, category)): Path<(String, String)>,
) -> Response {
    let media_type = match parse_media_type(&media_type) {
        Ok(mt) => mt,
        Err(resp) => return resp,
    };
    let category = match Category::parse(&category) {
        Some(c) if c.supports(media_type) => c,
        _ => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("No {category} list for {media_type}"),
            )
        }
    };
    fetch_items(&state, CatalogRequest::Category { media_type, category }).await
}

#[derive(Deserialize)]
struct TrendingQuery {
    #[serde(default)]
    window: TimeWindow,
}

async fn get_trending(
    State(state): State<AppState>,
    Path(media_type): Path<String>,
    Query(params): Query<TrendingQuery>,
) -> Response {
    let media_type = match parse_media_type(&media_type) {
        Ok(mt) => mt,
        Err(resp) => return resp,
    };
    fetch_items(
        &state,
        CatalogRequest::Trending {
            media_type,
            window: params.window,
        },
    )
    .await
}

async fn get_genres(State(state): State<AppState>, Path(media_type): Path<String>) -> Response {
    let media_type = match parse_media_type(&media_type) {
        Ok(mt) => mt,
        Err(resp) => return resp,
    };
    let catalog = match require_catalog(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match fetch(catalog, CatalogRequest::Genres { media_type })
        .await
        .and_then(CatalogResponse::into_genres)
    {
        Ok(genres) => Json(genres).into_response(),
        Err(e) => network_error(e),
    }
}

#[derive(Deserialize)]
struct DiscoverQuery {
    genre: u32,
}

async fn discover(
    State(state): State<AppState>,
    Path(media_type): Path<String>,
    Query(params): Query<DiscoverQuery>,
) -> Response {
    let media_type = match parse_media_type(&media_type) {
        Ok(mt) => mt,
        Err(resp) => return resp,
    };
    fetch_items(&state, browse::genre_request(media_type, params.genre)).await
}

// ── GET /api/details/{media_type}/{id} ───────────────────────

async fn get_details(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, u32)>,
) -> Response {
    let media_type = match parse_media_type(&media_type) {
        Ok(mt) => mt,
        Err(resp) => return resp,
    };
    let catalog = match require_catalog(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let detail = match fetch(catalog, CatalogRequest::Detail { media_type, id })
        .await
        .and_then(CatalogResponse::into_detail)
    {
        Ok(d) => d,
        Err(e) => return network_error(e),
    };

    match state.favorites.is_favorite(MediaKey::new(id, media_type)).await {
        Ok(favorite) => Json(ApiDetail::new(&detail, favorite)).into_response(),
        Err(e) => worker_error(e),
    }
}

// ── GET /api/search?q=...&scope=multi|movie|tv ───────────────

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
    #[serde(default)]
    scope: SearchScope,
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchQuery>) -> Response {
    let query = params.q.unwrap_or_default().trim().to_string();
    if query.is_empty() {
        return Json(Vec::<()>::new()).into_response();
    }
    fetch_items(
        &state,
        CatalogRequest::Search {
            scope: params.scope,
            query,
        },
    )
    .await
}

// ── GET /api/health ──────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Response {
    match state.favorites.status().await {
        Ok(status) => Json(ApiHealth {
            favorites: status.count,
            storage_durable: status.durable,
            catalog: state.catalog.as_ref().map(|c| c.name().to_string()),
        })
        .into_response(),
        Err(e) => worker_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{MediaDetail, MediaItem};
    use crate::infra::json_file::JsonFileStorage;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Serves a fixed item per list request and fails search on demand.
    struct FakeCatalog;

    impl CatalogGateway for FakeCatalog {
        fn name(&self) -> &str {
            "fake"
        }

        fn fetch(&self, request: &CatalogRequest) -> Result<CatalogResponse, NetworkError> {
            match request {
                CatalogRequest::Search { query, .. } if query == "offline" => {
                    Err(NetworkError::Unreachable("connection refused".into()))
                }
                CatalogRequest::Detail { id: 404, .. } => Err(NetworkError::NotFound),
                CatalogRequest::Detail { media_type, id } => {
                    Ok(CatalogResponse::Detail(Box::new(MediaDetail {
                        item: MediaItem::new(*id, *media_type, "Detail"),
                        genres: Vec::new(),
                        runtime_minutes: Some(120),
                        tagline: None,
                        number_of_seasons: None,
                        cast: Vec::new(),
                        similar: Vec::new(),
                        trailer: None,
                    })))
                }
                CatalogRequest::Genres { .. } => Ok(CatalogResponse::Genres(Vec::new())),
                CatalogRequest::Category { media_type, .. }
                | CatalogRequest::Trending { media_type, .. }
                | CatalogRequest::Genre { media_type, .. } => Ok(CatalogResponse::Items(
                    (1..=12)
                        .map(|i| MediaItem::new(i, *media_type, format!("Item {i}")))
                        .collect(),
                )),
                CatalogRequest::Search { .. } => Ok(CatalogResponse::Items(vec![
                    MediaItem::new(550, MediaType::Movie, "Fight Club"),
                ])),
            }
        }
    }

    fn app(dir: &tempfile::TempDir, with_catalog: bool) -> Router {
        let path = dir.path().join("favorites.json");
        let favorites = FavoritesHandle::spawn(move || Ok(JsonFileStorage::new(path))).unwrap();
        let catalog: Option<Arc<dyn CatalogGateway>> = if with_catalog {
            Some(Arc::new(FakeCatalog))
        } else {
            None
        };
        router(AppState { favorites, catalog })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_favorites_round_trip_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, false);

        let movie = json!({"id": 550, "media_type": "movie", "title": "Fight Club"});
        let (status, _) = send(&app, "POST", "/api/favorites", Some(movie.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&app, "POST", "/api/favorites", Some(movie)).await;
        assert_eq!(status, StatusCode::OK);

        let show = json!({"id": 550, "media_type": "tv", "name": "Fight Club Series"});
        send(&app, "POST", "/api/favorites", Some(show)).await;

        let (_, list) = send(&app, "GET", "/api/favorites", None).await;
        assert_eq!(list["count"], 2);
        assert_eq!(list["items"][1]["title"], "Fight Club Series");

        let (status, _) = send(&app, "DELETE", "/api/favorites/movie/550", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, member) = send(&app, "GET", "/api/favorites/movie/550", None).await;
        assert_eq!(member, json!({"favorite": false}));
        let (_, member) = send(&app, "GET", "/api/favorites/tv/550", None).await;
        assert_eq!(member, json!({"favorite": true}));
    }

    #[tokio::test]
    async fn test_invalid_favorite_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, false);

        let (status, body) = send(&app, "POST", "/api/favorites", Some(json!({"title": "No id"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("id"));

        let (status, _) = send(&app, "GET", "/api/favorites/person/1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_toggle_flips_membership() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, false);
        let item = json!({"id": 7, "mediaType": "movie", "title": "Se7en"});

        let (_, first) = send(&app, "POST", "/api/favorites/toggle", Some(item.clone())).await;
        let (_, second) = send(&app, "POST", "/api/favorites/toggle", Some(item)).await;
        assert_eq!(first, json!({"favorite": true}));
        assert_eq!(second, json!({"favorite": false}));
    }

    #[tokio::test]
    async fn test_catalog_routes_need_a_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, false);
        let (status, _) = send(&app, "GET", "/api/pages/home", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (_, health) = send(&app, "GET", "/api/health", None).await;
        assert_eq!(health["catalog"], Value::Null);
        assert_eq!(health["storageDurable"], true);
    }

    #[tokio::test]
    async fn test_home_page_rows_and_featured() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, true);

        let (status, page) = send(&app, "GET", "/api/pages/home", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["rows"].as_array().unwrap().len(), 7);
        assert_eq!(page["rows"][3]["title"], "Top 10 Movies Today");
        assert_eq!(page["rows"][3]["items"].as_array().unwrap().len(), 10);
        assert_eq!(page["featured"].as_array().unwrap().len(), 5);

        let (status, _) = send(&app, "GET", "/api/pages/kids", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_category_support_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, true);

        let (status, items) = send(&app, "GET", "/api/catalog/movie/upcoming", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(items.as_array().unwrap().len(), 12);

        let (status, _) = send(&app, "GET", "/api/catalog/tv/upcoming", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_discover_returns_the_genre_list() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, true);

        let (status, items) = send(&app, "GET", "/api/discover/tv?genre=18", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(items.as_array().unwrap().len(), 12);
        assert_eq!(items[0]["mediaType"], "tv");

        let (status, _) = send(&app, "GET", "/api/discover/movie", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_errors_and_empty_query() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, true);

        let (status, body) = send(&app, "GET", "/api/search?q=%20%20", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = send(&app, "GET", "/api/search?q=fight", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["title"], "Fight Club");

        let (status, body) = send(&app, "GET", "/api/search?q=offline", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("unreachable"));
    }

    #[tokio::test]
    async fn test_details_report_membership() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, true);
        send(
            &app,
            "POST",
            "/api/favorites",
            Some(json!({"id": 42, "mediaType": "tv", "title": "Detail"})),
        )
        .await;

        let (status, detail) = send(&app, "GET", "/api/details/tv/42", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["favorite"], true);
        assert_eq!(detail["runtimeMinutes"], 120);

        let (_, detail) = send(&app, "GET", "/api/details/movie/42", None).await;
        assert_eq!(detail["favorite"], false);

        let (status, _) = send(&app, "GET", "/api/details/movie/404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
