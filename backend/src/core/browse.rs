//! Row layouts of the browse pages and the hero selection.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::catalog::{CatalogRequest, Category, NetworkError, TimeWindow};
use crate::core::models::{MediaItem, MediaType};

/// Home hero carousel length. Movies and TV Shows show a single hero.
pub const HOME_FEATURED: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Movies,
    TvShows,
    NewPopular,
}

impl Page {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "home" => Some(Page::Home),
            "movies" => Some(Page::Movies),
            "tv" | "tv-shows" => Some(Page::TvShows),
            "new" | "new-popular" => Some(Page::NewPopular),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub media_type: MediaType,
    pub request: CatalogRequest,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: &'static str,
    pub title: &'static str,
    pub media_type: MediaType,
    pub items: Vec<MediaItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    pub featured: Vec<MediaItem>,
    pub rows: Vec<Row>,
}

fn category(media_type: MediaType, category: Category) -> CatalogRequest {
    CatalogRequest::Category { media_type, category }
}

fn trending(media_type: MediaType) -> CatalogRequest {
    CatalogRequest::Trending {
        media_type,
        window: TimeWindow::Week,
    }
}

fn row(
    id: &'static str,
    title: &'static str,
    media_type: MediaType,
    request: CatalogRequest,
) -> RowSpec {
    RowSpec {
        id,
        title,
        media_type,
        request,
        limit: None,
    }
}

/// Rows of `page` in display order.
pub fn layout(page: Page) -> Vec<RowSpec> {
    use MediaType::{Movie, Tv};

    match page {
        Page::Home => vec![
            row("trending", "Trending Now", Movie, trending(Movie)),
            row("popular-tv", "Popular on Netflix", Tv, category(Tv, Category::Popular)),
            row("now-playing", "Now Playing in Theaters", Movie, category(Movie, Category::NowPlaying)),
            RowSpec {
                limit: Some(10),
                ..row("top-rated", "Top 10 Movies Today", Movie, category(Movie, Category::TopRated))
            },
            row("tv-top-rated", "Top Rated TV Shows", Tv, category(Tv, Category::TopRated)),
            row("upcoming", "Coming Soon", Movie, category(Movie, Category::Upcoming)),
            row("popular", "Popular Movies", Movie, category(Movie, Category::Popular)),
        ],
        Page::Movies => vec![
            row("now-playing", "Now Playing", Movie, category(Movie, Category::NowPlaying)),
            row("popular", "Popular Movies", Movie, category(Movie, Category::Popular)),
            row("top-rated", "Top Rated", Movie, category(Movie, Category::TopRated)),
            row("upcoming", "Coming Soon", Movie, category(Movie, Category::Upcoming)),
        ],
        Page::TvShows => vec![
            row("trending-tv", "Trending TV Shows", Tv, trending(Tv)),
            row("popular-tv", "Popular on Netflix", Tv, category(Tv, Category::Popular)),
            row("top-rated-tv", "Top Rated Series", Tv, category(Tv, Category::TopRated)),
        ],
        Page::NewPopular => vec![
            row("trending-movies", "Trending Movies", Movie, trending(Movie)),
            row("trending-tv", "Trending TV Shows", Tv, trending(Tv)),
            row("coming-soon", "Coming Soon", Movie, category(Movie, Category::Upcoming)),
        ],
    }
}

/// Row whose items feed the hero, and how many of them it shows.
pub fn featured_row(page: Page) -> Option<(&'static str, usize)> {
    match page {
        Page::Home => Some(("trending", HOME_FEATURED)),
        Page::Movies => Some(("now-playing", 1)),
        Page::TvShows => Some(("trending-tv", 1)),
        Page::NewPopular => None,
    }
}

/// Request behind the single row shown while a genre filter is active.
pub fn genre_request(media_type: MediaType, genre_id: u32) -> CatalogRequest {
    CatalogRequest::Genre { media_type, genre_id }
}

pub fn featured(items: &[MediaItem], limit: usize) -> Vec<MediaItem> {
    items.iter().take(limit).cloned().collect()
}

pub type Fetched = HashMap<CatalogRequest, Result<Vec<MediaItem>, NetworkError>>;

/// Builds a page from already-fetched responses. Fails with the first
/// missing or failed row, mirroring an all-or-nothing page load.
pub fn assemble(page: Page, fetched: &Fetched) -> Result<PageContent, NetworkError> {
    let rows = fill_rows(layout(page), fetched)?;

    let featured = featured_row(page)
        .and_then(|(id, limit)| rows.iter().find(|r| r.id == id).map(|r| featured(&r.items, limit)))
        .unwrap_or_default();

    Ok(PageContent { featured, rows })
}

/// Fills each row from the response to its request. Rows sharing a request
/// read the same response.
pub fn fill_rows(specs: Vec<RowSpec>, fetched: &Fetched) -> Result<Vec<Row>, NetworkError> {
    let mut rows = Vec::with_capacity(specs.len());

    for spec in specs {
        let items = match fetched.get(&spec.request) {
            Some(Ok(items)) => items.clone(),
            Some(Err(e)) => return Err(e.clone()),
            None => return Err(NetworkError::Malformed(format!("row {} was not fetched", spec.id))),
        };
        let items = match spec.limit {
            Some(limit) => items.into_iter().take(limit).collect(),
            None => items,
        };
        rows.push(Row {
            id: spec.id,
            title: spec.title,
            media_type: spec.media_type,
            items,
        });
    }
    Ok(rows)
}

/// Distinct requests behind `specs`, in first-use order.
pub fn requests(specs: &[RowSpec]) -> Vec<CatalogRequest> {
    let mut out: Vec<CatalogRequest> = Vec::new();
    for spec in specs {
        if !out.contains(&spec.request) {
            out.push(spec.request.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{CatalogGateway, CatalogResponse};
    use std::sync::Mutex;

    fn fetch_all(gateway: &dyn CatalogGateway, specs: &[RowSpec]) -> Fetched {
        requests(specs)
            .into_iter()
            .map(|request| {
                let result = gateway.fetch(&request).and_then(|r| r.into_items());
                (request, result)
            })
            .collect()
    }

    fn load_page(gateway: &dyn CatalogGateway, page: Page) -> Result<PageContent, NetworkError> {
        let fetched = fetch_all(gateway, &layout(page));
        assemble(page, &fetched)
    }

    /// Gateway returning `count` numbered items per request, recording calls.
    struct FakeGateway {
        count: u32,
        calls: Mutex<Vec<CatalogRequest>>,
        fail_on: Option<CatalogRequest>,
    }

    impl FakeGateway {
        fn new(count: u32) -> Self {
            Self {
                count,
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }
    }

    impl CatalogGateway for FakeGateway {
        fn name(&self) -> &str {
            "fake"
        }

        fn fetch(&self, request: &CatalogRequest) -> Result<CatalogResponse, NetworkError> {
            self.calls.lock().unwrap().push(request.clone());
            if self.fail_on.as_ref() == Some(request) {
                return Err(NetworkError::Status(500));
            }
            let media_type = match request {
                CatalogRequest::Category { media_type, .. }
                | CatalogRequest::Trending { media_type, .. } => *media_type,
                _ => MediaType::Movie,
            };
            Ok(CatalogResponse::Items(
                (1..=self.count)
                    .map(|i| MediaItem::new(i, media_type, format!("Item {i}")))
                    .collect(),
            ))
        }
    }

    #[test]
    fn test_home_layout_matches_rows() {
        let titles: Vec<&str> = layout(Page::Home).iter().map(|r| r.title).collect();
        assert_eq!(
            titles,
            vec![
                "Trending Now",
                "Popular on Netflix",
                "Now Playing in Theaters",
                "Top 10 Movies Today",
                "Top Rated TV Shows",
                "Coming Soon",
                "Popular Movies",
            ]
        );
    }

    #[test]
    fn test_home_truncates_top_ten_and_features_five() {
        let gateway = FakeGateway::new(20);
        let content = load_page(&gateway, Page::Home).unwrap();

        let top = content.rows.iter().find(|r| r.id == "top-rated").unwrap();
        assert_eq!(top.items.len(), 10);
        let popular = content.rows.iter().find(|r| r.id == "popular").unwrap();
        assert_eq!(popular.items.len(), 20);

        assert_eq!(content.featured.len(), HOME_FEATURED);
        assert_eq!(content.featured[0].media_type, MediaType::Movie);
    }

    #[test]
    fn test_movies_and_tv_show_a_single_hero() {
        let gateway = FakeGateway::new(20);
        let movies = load_page(&gateway, Page::Movies).unwrap();
        assert_eq!(movies.featured.len(), 1);
        assert_eq!(movies.featured[0].id, 1);

        let tv = load_page(&gateway, Page::TvShows).unwrap();
        assert_eq!(tv.featured.len(), 1);
        assert_eq!(tv.featured[0].media_type, MediaType::Tv);
    }

    #[test]
    fn test_shared_requests_are_fetched_once() {
        let popular = category(MediaType::Movie, Category::Popular);
        let specs = vec![
            row("popular", "Popular Movies", MediaType::Movie, popular.clone()),
            row("trending", "Trending Now", MediaType::Movie, trending(MediaType::Movie)),
            RowSpec {
                limit: Some(2),
                ..row("popular-short", "Popular Picks", MediaType::Movie, popular.clone())
            },
        ];
        assert_eq!(requests(&specs).len(), 2);

        let gateway = FakeGateway::new(6);
        let fetched = fetch_all(&gateway, &specs);
        let calls = gateway.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls.iter().filter(|r| **r == popular).count(), 1);

        let rows = fill_rows(specs, &fetched).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].items.len(), 6);
        assert_eq!(rows[2].items.len(), 2);
        assert_eq!(rows[2].items[..], rows[0].items[..2]);
    }

    #[test]
    fn test_shipped_layouts_need_one_fetch_per_row() {
        for page in [Page::Home, Page::Movies, Page::TvShows, Page::NewPopular] {
            assert_eq!(requests(&layout(page)).len(), layout(page).len());
        }
    }

    #[test]
    fn test_new_popular_has_no_featured() {
        let gateway = FakeGateway::new(8);
        let content = load_page(&gateway, Page::NewPopular).unwrap();
        assert!(content.featured.is_empty());
        assert_eq!(content.rows.len(), 3);
    }

    #[test]
    fn test_one_failed_row_fails_the_page() {
        let mut gateway = FakeGateway::new(4);
        gateway.fail_on = Some(CatalogRequest::Category {
            media_type: MediaType::Movie,
            category: Category::Upcoming,
        });
        assert_eq!(
            load_page(&gateway, Page::Movies),
            Err(NetworkError::Status(500))
        );
    }

    #[test]
    fn test_featured_on_short_list() {
        let items = vec![MediaItem::new(1, MediaType::Tv, "Only")];
        assert_eq!(featured(&items, HOME_FEATURED).len(), 1);
        assert!(featured(&[], HOME_FEATURED).is_empty());
    }

    #[test]
    fn test_page_parse_aliases() {
        assert_eq!(Page::parse("tv-shows"), Some(Page::TvShows));
        assert_eq!(Page::parse("new"), Some(Page::NewPopular));
        assert_eq!(Page::parse("my-list"), None);
    }
}
