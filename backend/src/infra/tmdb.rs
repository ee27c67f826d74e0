use crate::core::catalog::{
    CatalogGateway, CatalogRequest, CatalogResponse, NetworkError, SearchScope,
};
use crate::core::models::{CastMember, Genre, MediaDetail, MediaItem, MediaType, Trailer};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Cast and similar titles shown in the detail modal.
const DETAIL_LIST_LIMIT: usize = 6;

// ── Response types ───────────────────────────────────────────────

#[derive(Deserialize)]
struct PagedResponse<T> {
    results: Vec<T>,
}

#[derive(Deserialize)]
struct MovieResult {
    id: u32,
    #[serde(default)]
    title: String,
    vote_average: Option<f32>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
}

#[derive(Deserialize)]
struct TvResult {
    id: u32,
    #[serde(default)]
    name: String,
    vote_average: Option<f32>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "media_type", rename_all = "lowercase")]
enum MultiResult {
    Movie(MovieResult),
    Tv(TvResult),
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct GenreList {
    genres: Vec<Genre>,
}

#[derive(Deserialize)]
struct Video {
    key: String,
    name: String,
    site: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct CastResult {
    name: String,
    character: Option<String>,
    profile_path: Option<String>,
}

#[derive(Deserialize, Default)]
struct Credits {
    #[serde(default)]
    cast: Vec<CastResult>,
}

#[derive(Deserialize)]
struct MovieDetailResult {
    #[serde(flatten)]
    base: MovieResult,
    #[serde(default)]
    genres: Vec<Genre>,
    runtime: Option<u32>,
    tagline: Option<String>,
    videos: Option<PagedResponse<Video>>,
    credits: Option<Credits>,
    similar: Option<PagedResponse<MovieResult>>,
}

#[derive(Deserialize)]
struct TvDetailResult {
    #[serde(flatten)]
    base: TvResult,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    episode_run_time: Vec<u32>,
    number_of_seasons: Option<u32>,
    tagline: Option<String>,
    videos: Option<PagedResponse<Video>>,
    credits: Option<Credits>,
    similar: Option<PagedResponse<TvResult>>,
}

// ── Normalization ────────────────────────────────────────────────

/// A raw catalog entry before the movie/series shapes are merged.
enum CatalogEntry {
    Movie(MovieResult),
    Series(TvResult),
}

impl From<CatalogEntry> for MediaItem {
    fn from(entry: CatalogEntry) -> Self {
        match entry {
            CatalogEntry::Movie(m) => MediaItem {
                id: m.id,
                media_type: MediaType::Movie,
                title: m.title,
                poster_path: non_empty(m.poster_path),
                backdrop_path: non_empty(m.backdrop_path),
                vote_average: m.vote_average.map(|v| v.clamp(0.0, 10.0)),
                release_date: non_empty(m.release_date),
                overview: non_empty(m.overview),
            },
            CatalogEntry::Series(t) => MediaItem {
                id: t.id,
                media_type: MediaType::Tv,
                title: t.name,
                poster_path: non_empty(t.poster_path),
                backdrop_path: non_empty(t.backdrop_path),
                vote_average: t.vote_average.map(|v| v.clamp(0.0, 10.0)),
                release_date: non_empty(t.first_air_date),
                overview: non_empty(t.overview),
            },
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Drops entries the favorites store would reject (no id, no title).
fn normalize(entries: impl IntoIterator<Item = CatalogEntry>) -> Vec<MediaItem> {
    entries
        .into_iter()
        .map(MediaItem::from)
        .filter(|item| match item.validate() {
            Ok(()) => true,
            Err(e) => {
                debug!(key = %item.key(), error = %e, "Dropping catalog entry");
                false
            }
        })
        .collect()
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, NetworkError> {
    serde_json::from_str(body).map_err(|e| NetworkError::Malformed(e.to_string()))
}

fn parse_list(media_type: MediaType, body: &str) -> Result<Vec<MediaItem>, NetworkError> {
    match media_type {
        MediaType::Movie => {
            let page: PagedResponse<MovieResult> = decode(body)?;
            Ok(normalize(page.results.into_iter().map(CatalogEntry::Movie)))
        }
        MediaType::Tv => {
            let page: PagedResponse<TvResult> = decode(body)?;
            Ok(normalize(page.results.into_iter().map(CatalogEntry::Series)))
        }
    }
}

/// Multi search mixes movies, series and people; people are dropped.
fn parse_multi(body: &str) -> Result<Vec<MediaItem>, NetworkError> {
    let page: PagedResponse<MultiResult> = decode(body)?;
    Ok(normalize(page.results.into_iter().filter_map(|r| match r {
        MultiResult::Movie(m) => Some(CatalogEntry::Movie(m)),
        MultiResult::Tv(t) => Some(CatalogEntry::Series(t)),
        MultiResult::Other => None,
    })))
}

fn parse_genres(body: &str) -> Result<Vec<Genre>, NetworkError> {
    let list: GenreList = decode(body)?;
    Ok(list.genres)
}

fn pick_trailer(videos: Option<PagedResponse<Video>>) -> Option<Trailer> {
    videos?
        .results
        .into_iter()
        .find(|v| v.kind == "Trailer" && v.site == "YouTube")
        .map(|v| Trailer {
            key: v.key,
            name: v.name,
        })
}

fn top_cast(credits: Option<Credits>) -> Vec<CastMember> {
    credits
        .unwrap_or_default()
        .cast
        .into_iter()
        .take(DETAIL_LIST_LIMIT)
        .map(|c| CastMember {
            name: c.name,
            character: non_empty(c.character),
            profile_path: non_empty(c.profile_path),
        })
        .collect()
}

fn parse_detail(media_type: MediaType, body: &str) -> Result<MediaDetail, NetworkError> {
    let detail = match media_type {
        MediaType::Movie => {
            let d: MovieDetailResult = decode(body)?;
            let similar = d.similar.map(|p| p.results).unwrap_or_default();
            MediaDetail {
                item: CatalogEntry::Movie(d.base).into(),
                genres: d.genres,
                runtime_minutes: d.runtime.filter(|&r| r > 0),
                tagline: non_empty(d.tagline),
                number_of_seasons: None,
                cast: top_cast(d.credits),
                similar: normalize(similar.into_iter().map(CatalogEntry::Movie))
                    .into_iter()
                    .take(DETAIL_LIST_LIMIT)
                    .collect(),
                trailer: pick_trailer(d.videos),
            }
        }
        MediaType::Tv => {
            let d: TvDetailResult = decode(body)?;
            let similar = d.similar.map(|p| p.results).unwrap_or_default();
            MediaDetail {
                item: CatalogEntry::Series(d.base).into(),
                genres: d.genres,
                runtime_minutes: d.episode_run_time.first().copied(),
                tagline: non_empty(d.tagline),
                number_of_seasons: d.number_of_seasons,
                cast: top_cast(d.credits),
                similar: normalize(similar.into_iter().map(CatalogEntry::Series))
                    .into_iter()
                    .take(DETAIL_LIST_LIMIT)
                    .collect(),
                trailer: pick_trailer(d.videos),
            }
        }
    };
    Ok(detail)
}

/// Path and extra query parameters for a request.
fn endpoint(request: &CatalogRequest) -> (String, Vec<(&'static str, String)>) {
    match request {
        CatalogRequest::Category { media_type, category } => {
            (format!("/{media_type}/{}", category.as_str()), Vec::new())
        }
        CatalogRequest::Trending { media_type, window } => {
            (format!("/trending/{media_type}/{}", window.as_str()), Vec::new())
        }
        CatalogRequest::Genre { media_type, genre_id } => (
            format!("/discover/{media_type}"),
            vec![("with_genres", genre_id.to_string())],
        ),
        CatalogRequest::Genres { media_type } => {
            (format!("/genre/{media_type}/list"), Vec::new())
        }
        CatalogRequest::Detail { media_type, id } => (
            format!("/{media_type}/{id}"),
            vec![("append_to_response", "videos,credits,similar".to_string())],
        ),
        CatalogRequest::Search { scope, query } => {
            let path = match scope {
                SearchScope::Movie => "/search/movie",
                SearchScope::Tv => "/search/tv",
                SearchScope::Multi => "/search/multi",
            };
            (
                path.to_string(),
                vec![
                    ("query", query.clone()),
                    ("include_adult", "false".to_string()),
                    ("page", "1".to_string()),
                ],
            )
        }
    }
}

// ── Client ───────────────────────────────────────────────────────

pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    /// Returns None for an empty key so the app can still run without it.
    pub fn new(api_key: &str, base_url: &str) -> Option<Self> {
        if api_key.is_empty() {
            return None;
        }
        Some(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str, params: &[(&'static str, String)]) -> Result<String, NetworkError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "TMDB request");

        let resp = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(params)
            .send()
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(NetworkError::NotFound);
        }
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "TMDB request failed");
            return Err(NetworkError::Status(status.as_u16()));
        }

        resp.text()
            .map_err(|e| NetworkError::Unreachable(e.to_string()))
    }
}

impl CatalogGateway for TmdbClient {
    fn name(&self) -> &str {
        "TMDB"
    }

    fn fetch(&self, request: &CatalogRequest) -> Result<CatalogResponse, NetworkError> {
        let (path, params) = endpoint(request);
        let body = self.get(&path, &params)?;

        match request {
            CatalogRequest::Category { media_type, .. }
            | CatalogRequest::Trending { media_type, .. }
            | CatalogRequest::Genre { media_type, .. } => {
                parse_list(*media_type, &body).map(CatalogResponse::Items)
            }
            CatalogRequest::Search { scope, .. } => {
                let items = match scope {
                    SearchScope::Movie => parse_list(MediaType::Movie, &body)?,
                    SearchScope::Tv => parse_list(MediaType::Tv, &body)?,
                    SearchScope::Multi => parse_multi(&body)?,
                };
                Ok(CatalogResponse::Items(items))
            }
            CatalogRequest::Genres { .. } => parse_genres(&body).map(CatalogResponse::Genres),
            CatalogRequest::Detail { media_type, .. } => {
                parse_detail(*media_type, &body).map(|d| CatalogResponse::Detail(Box::new(d)))
            }
        }
    }
}
