use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const POSTER_SIZE: &str = "w500";
const BACKDROP_SIZE: &str = "original";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Media item is missing its catalog id")]
    MissingId,

    #[error("Media item is missing its media type")]
    MissingMediaType,

    #[error("Media item {0} has an empty title")]
    EmptyTitle(MediaKey),

    #[error("Vote average {0} is outside 0-10")]
    VoteOutOfRange(f32),

    #[error("Unknown media type: {0}")]
    UnknownMediaType(String),
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(ValidationError::UnknownMediaType(other.to_string())),
        }
    }
}

/// Compound identity of a catalog entry. A movie and a series may share a
/// numeric id, so the id alone never identifies an item.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct MediaKey {
    pub id: u32,
    pub media_type: MediaType,
}

impl MediaKey {
    pub fn new(id: u32, media_type: MediaType) -> Self {
        Self { id, media_type }
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.id)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: u32,
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl MediaItem {
    #[allow(dead_code)]
    pub fn new(id: u32, media_type: MediaType, title: impl Into<String>) -> Self {
        Self {
            id,
            media_type,
            title: title.into(),
            poster_path: None,
            backdrop_path: None,
            vote_average: None,
            release_date: None,
            overview: None,
        }
    }

    pub fn key(&self) -> MediaKey {
        MediaKey::new(self.id, self.media_type)
    }

    /// Checks the fields the favorites store relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id == 0 {
            return Err(ValidationError::MissingId);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle(self.key()));
        }
        if let Some(v) = self.vote_average {
            if !(0.0..=10.0).contains(&v) {
                return Err(ValidationError::VoteOutOfRange(v));
            }
        }
        Ok(())
    }

    /// Four-digit year from the release (or first air) date.
    pub fn year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .filter(|y| y.len() == 4)
    }

    pub fn poster_url(&self) -> Option<String> {
        image_url(self.poster_path.as_deref(), POSTER_SIZE)
    }

    pub fn backdrop_url(&self) -> Option<String> {
        image_url(self.backdrop_path.as_deref(), BACKDROP_SIZE)
    }

    /// Rating rounded to one decimal, as shown on cards.
    pub fn rating_display(&self) -> Option<String> {
        self.vote_average.map(|v| format!("{v:.1}"))
    }
}

pub fn image_url(path: Option<&str>, size: &str) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{IMAGE_BASE}/{size}{p}"))
}

// ── Detail projection ────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Trailer {
    pub key: String,
    pub name: String,
}

impl Trailer {
    pub fn youtube_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.key)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MediaDetail {
    #[serde(flatten)]
    pub item: MediaItem,
    pub genres: Vec<Genre>,
    pub runtime_minutes: Option<u32>,
    pub tagline: Option<String>,
    pub number_of_seasons: Option<u32>,
    pub cast: Vec<CastMember>,
    pub similar: Vec<MediaItem>,
    pub trailer: Option<Trailer>,
}

impl MediaDetail {
    pub fn genre_names(&self) -> String {
        self.genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
