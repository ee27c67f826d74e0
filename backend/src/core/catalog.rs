use crate::core::models::{Genre, MediaDetail, MediaItem, MediaType};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Catalog unreachable: {0}")]
    Unreachable(String),

    #[error("Catalog returned HTTP {0}")]
    Status(u16),

    #[error("Catalog resource not found")]
    NotFound,

    #[error("Malformed catalog response: {0}")]
    Malformed(String),
}

/// Fixed catalog lists. Not every list exists for both media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Popular => "popular",
            Category::TopRated => "top_rated",
            Category::Upcoming => "upcoming",
            Category::NowPlaying => "now_playing",
        }
    }

    pub fn supports(&self, media_type: MediaType) -> bool {
        match self {
            Category::Popular | Category::TopRated => true,
            Category::Upcoming | Category::NowPlaying => media_type == MediaType::Movie,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "popular" => Some(Category::Popular),
            "top_rated" => Some(Category::TopRated),
            "upcoming" => Some(Category::Upcoming),
            "now_playing" => Some(Category::NowPlaying),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Movie,
    Tv,
    #[default]
    Multi,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogRequest {
    Category {
        media_type: MediaType,
        category: Category,
    },
    Trending {
        media_type: MediaType,
        window: TimeWindow,
    },
    Genre {
        media_type: MediaType,
        genre_id: u32,
    },
    Genres {
        media_type: MediaType,
    },
    Detail {
        media_type: MediaType,
        id: u32,
    },
    Search {
        scope: SearchScope,
        query: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogResponse {
    Items(Vec<MediaItem>),
    Detail(Box<MediaDetail>),
    Genres(Vec<Genre>),
}

impl CatalogResponse {
    /// The item list of a list request; other shapes are a contract breach.
    pub fn into_items(self) -> Result<Vec<MediaItem>, NetworkError> {
        match self {
            CatalogResponse::Items(items) => Ok(items),
            other => Err(NetworkError::Malformed(format!(
                "expected an item list, got {}",
                other.kind()
            ))),
        }
    }

    pub fn into_detail(self) -> Result<MediaDetail, NetworkError> {
        match self {
            CatalogResponse::Detail(detail) => Ok(*detail),
            other => Err(NetworkError::Malformed(format!(
                "expected a detail object, got {}",
                other.kind()
            ))),
        }
    }

    pub fn into_genres(self) -> Result<Vec<Genre>, NetworkError> {
        match self {
            CatalogResponse::Genres(genres) => Ok(genres),
            other => Err(NetworkError::Malformed(format!(
                "expected a genre list, got {}",
                other.kind()
            ))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            CatalogResponse::Items(_) => "item list",
            CatalogResponse::Detail(_) => "detail object",
            CatalogResponse::Genres(_) => "genre list",
        }
    }
}

/// Source of catalog data. Every call is independent; implementations do
/// not cache and callers do not coordinate concurrent requests.
pub trait CatalogGateway: Send + Sync {
    fn name(&self) -> &str;
    fn fetch(&self, request: &CatalogRequest) -> Result<CatalogResponse, NetworkError>;
}
