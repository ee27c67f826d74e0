use serde::{Deserialize, Serialize};

use crate::core::browse::PageContent;
use crate::core::models::{
    image_url, CastMember, Genre, MediaDetail, MediaItem, MediaType, Trailer, ValidationError,
};

/// Loose JSON accepted when the front end saves a title. Cards hand over
/// whatever shape they were rendered from, so both the catalog's
/// snake_case fields and the stored camelCase fields are accepted, and a
/// series may arrive with `name` instead of `title`.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiFavoriteInput {
    pub id: Option<u32>,
    #[serde(alias = "media_type")]
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    #[serde(alias = "poster_path")]
    pub poster_path: Option<String>,
    #[serde(alias = "backdrop_path")]
    pub backdrop_path: Option<String>,
    #[serde(alias = "vote_average")]
    pub vote_average: Option<f32>,
    #[serde(alias = "release_date", alias = "first_air_date", alias = "firstAirDate")]
    pub release_date: Option<String>,
    pub overview: Option<String>,
}

impl ApiFavoriteInput {
    pub fn into_media_item(self) -> Result<MediaItem, ValidationError> {
        let id = self.id.ok_or(ValidationError::MissingId)?;
        let media_type: MediaType = self
            .media_type
            .as_deref()
            .ok_or(ValidationError::MissingMediaType)?
            .parse()?;

        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .or(self.name)
            .unwrap_or_default();

        let item = MediaItem {
            id,
            media_type,
            title,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            vote_average: self.vote_average,
            release_date: self.release_date,
            overview: self.overview,
        };
        item.validate()?;
        Ok(item)
    }
}

/// A card as rendered by the front end: the stored fields plus resolved
/// image URLs and display values.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiMediaItem {
    #[serde(flatten)]
    pub item: MediaItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
}

impl From<&MediaItem> for ApiMediaItem {
    fn from(item: &MediaItem) -> Self {
        ApiMediaItem {
            item: item.clone(),
            poster_url: item.poster_url(),
            backdrop_url: item.backdrop_url(),
            year: item.year().map(str::to_string),
            rating: item.rating_display(),
        }
    }
}

pub fn api_items(items: &[MediaItem]) -> Vec<ApiMediaItem> {
    items.iter().map(ApiMediaItem::from).collect()
}

// ── Favorites ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ApiFavorites {
    pub count: usize,
    pub items: Vec<ApiMediaItem>,
}

impl ApiFavorites {
    pub fn from_items(items: &[MediaItem]) -> Self {
        ApiFavorites {
            count: items.len(),
            items: api_items(items),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiMembership {
    pub favorite: bool,
}

// ── Browse pages ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRow {
    pub id: &'static str,
    pub title: &'static str,
    pub media_type: MediaType,
    pub items: Vec<ApiMediaItem>,
}

#[derive(Debug, Serialize)]
pub struct ApiPage {
    pub featured: Vec<ApiMediaItem>,
    pub rows: Vec<ApiRow>,
}

impl From<&PageContent> for ApiPage {
    fn from(page: &PageContent) -> Self {
        ApiPage {
            featured: api_items(&page.featured),
            rows: page
                .rows
                .iter()
                .map(|r| ApiRow {
                    id: r.id,
                    title: r.title,
                    media_type: r.media_type,
                    items: api_items(&r.items),
                })
                .collect(),
        }
    }
}

// ── Detail modal ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCastMember {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

impl From<&CastMember> for ApiCastMember {
    fn from(c: &CastMember) -> Self {
        ApiCastMember {
            name: c.name.clone(),
            character: c.character.clone(),
            profile_url: image_url(c.profile_path.as_deref(), "w185"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTrailer {
    pub key: String,
    pub name: String,
    pub url: String,
}

impl From<&Trailer> for ApiTrailer {
    fn from(t: &Trailer) -> Self {
        ApiTrailer {
            key: t.key.clone(),
            name: t.name.clone(),
            url: t.youtube_url(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDetail {
    #[serde(flatten)]
    pub item: ApiMediaItem,
    pub genres: Vec<Genre>,
    pub genre_names: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_seasons: Option<u32>,
    pub cast: Vec<ApiCastMember>,
    pub similar: Vec<ApiMediaItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer: Option<ApiTrailer>,
    pub favorite: bool,
}

impl ApiDetail {
    pub fn new(detail: &MediaDetail, favorite: bool) -> Self {
        ApiDetail {
            item: ApiMediaItem::from(&detail.item),
            genres: detail.genres.clone(),
            genre_names: detail.genre_names(),
            runtime_minutes: detail.runtime_minutes,
            tagline: detail.tagline.clone(),
            number_of_seasons: detail.number_of_seasons,
            cast: detail.cast.iter().map(ApiCastMember::from).collect(),
            similar: api_items(&detail.similar),
            trailer: detail.trailer.as_ref().map(ApiTrailer::from),
            favorite,
        }
    }
}

// ── Health ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    pub favorites: usize,
    pub storage_durable: bool,
    pub catalog: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}
