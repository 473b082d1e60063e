//! Domain types shared by the client and the shell.
//!
//! `PageState` and `QueryKey` are owned by this crate; the anime payloads
//! mirror the upstream schema loosely. Unknown upstream fields are ignored and
//! absent optional fields deserialize to `None`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of list items requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 24;

/// Page and search term as mirrored in the location's query string.
///
/// `page` is always at least 1. Writes that would break that (zero, negative,
/// or out-of-range numbers) are coerced to 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageState {
    page: u32,
    /// Free-text search term. Empty means no search.
    pub search: String,
}

impl Default for PageState {
    fn default() -> Self {
        Self { page: 1, search: String::new() }
    }
}

impl PageState {
    pub fn new(page: i64, search: impl Into<String>) -> Self {
        Self { page: clamp_page(page), search: search.into() }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Same search, different page.
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = clamp_page(page);
        self
    }

    /// New search term. Pagination does not survive a search change.
    pub fn with_search(self, search: impl Into<String>) -> Self {
        Self { page: 1, search: search.into() }
    }

    pub fn search_active(&self) -> bool {
        !self.search.is_empty()
    }

    /// Parse a raw `page` parameter, falling back to 1 for anything that is
    /// not a positive integer.
    pub fn parse_page(raw: &str) -> u32 {
        raw.trim().parse::<i64>().map(clamp_page).unwrap_or(1)
    }
}

fn clamp_page(page: i64) -> u32 {
    match u32::try_from(page) {
        Ok(0) | Err(_) => 1,
        Ok(page) => page,
    }
}

/// Kind of upstream resource a query addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    AnimeList,
    AnimeDetail,
}

/// Identity of a fetchable resource, used for cache lookup and de-duplication.
///
/// List keys carry the *debounced* search term, never the raw keystrokes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    AnimeList { page: u32, search: String },
    AnimeDetail { id: u64 },
}

impl QueryKey {
    pub fn list(page: u32, search: impl Into<String>) -> Self {
        Self::AnimeList { page: page.max(1), search: search.into() }
    }

    pub fn detail(id: u64) -> Self {
        Self::AnimeDetail { id }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::AnimeList { .. } => ResourceKind::AnimeList,
            Self::AnimeDetail { .. } => ResourceKind::AnimeDetail,
        }
    }

    /// Key of the following page with the same search term.
    ///
    /// Detail keys have no next page.
    pub fn next_page(&self) -> Option<Self> {
        match self {
            Self::AnimeList { page, search } => {
                Some(Self::AnimeList { page: page.saturating_add(1), search: search.clone() })
            }
            Self::AnimeDetail { .. } => None,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnimeList { page, search } => write!(f, "animeList[{page}, {search:?}]"),
            Self::AnimeDetail { id } => write!(f, "animeDetail[{id}]"),
        }
    }
}

/// One image size set (`jpg` or `webp`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrls {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: Option<ImageUrls>,
    #[serde(default)]
    pub webp: Option<ImageUrls>,
}

impl Images {
    /// Largest available poster, preferring jpg over webp.
    pub fn large(&self) -> Option<&str> {
        [&self.jpg, &self.webp]
            .into_iter()
            .flatten()
            .find_map(|set| set.large_image_url.as_deref().or(set.image_url.as_deref()))
    }
}

/// Genre, studio, or any other `{ mal_id, name }` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub mal_id: u64,
    pub name: String,
}

/// An entry of the anime list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeSummary {
    pub mal_id: u64,
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub images: Images,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<NamedResource>,
}

/// Full record of a single anime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeDetail {
    #[serde(flatten)]
    pub summary: AnimeSummary,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub rank: Option<u64>,
    #[serde(default)]
    pub popularity: Option<u64>,
    #[serde(default)]
    pub members: Option<u64>,
    #[serde(default)]
    pub favorites: Option<u64>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub studios: Vec<NamedResource>,
}

impl AnimeDetail {
    /// Synopsis cut to at most `max_chars` characters on a word boundary,
    /// with an ellipsis when something was dropped.
    pub fn synopsis_excerpt(&self, max_chars: usize) -> Option<String> {
        let synopsis = self.synopsis.as_deref()?.trim();
        if synopsis.chars().count() <= max_chars {
            return Some(synopsis.to_string());
        }

        let cut: String = synopsis.chars().take(max_chars).collect();
        let cut = match cut.rfind(char::is_whitespace) {
            Some(idx) if idx > 0 => &cut[..idx],
            _ => cut.as_str(),
        };
        Some(format!("{}...", cut.trim_end()))
    }
}

/// Page bookkeeping reported with every list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub last_page: u32,
    pub has_next: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { last_page: 1, has_next: false }
    }
}

/// One page of list results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPayload {
    pub items: Vec<AnimeSummary>,
    pub pagination: Pagination,
}

impl ListPayload {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_state_default() {
        let state = PageState::default();
        assert_eq!(state.page(), 1);
        assert!(state.search.is_empty());
        assert!(!state.search_active());
    }

    #[test]
    fn test_page_state_clamps_non_positive() {
        assert_eq!(PageState::new(0, "").page(), 1);
        assert_eq!(PageState::new(-4, "").page(), 1);
        assert_eq!(PageState::new(7, "").page(), 7);
        assert_eq!(PageState::new(i64::from(u32::MAX) + 1, "").page(), 1);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(PageState::parse_page("3"), 3);
        assert_eq!(PageState::parse_page(" 12 "), 12);
        assert_eq!(PageState::parse_page("abc"), 1);
        assert_eq!(PageState::parse_page(""), 1);
        assert_eq!(PageState::parse_page("0"), 1);
        assert_eq!(PageState::parse_page("-2"), 1);
        assert_eq!(PageState::parse_page("2.5"), 1);
    }

    #[test]
    fn test_with_search_resets_page() {
        let state = PageState::new(5, "naruto").with_search("bleach");
        assert_eq!(state.page(), 1);
        assert_eq!(state.search, "bleach");
    }

    #[test]
    fn test_query_key_equality() {
        assert_eq!(QueryKey::list(2, "naruto"), QueryKey::list(2, "naruto"));
        assert_ne!(QueryKey::list(2, "naruto"), QueryKey::list(3, "naruto"));
        assert_ne!(QueryKey::list(2, "naruto"), QueryKey::list(2, ""));
        assert_eq!(QueryKey::list(0, "").kind(), ResourceKind::AnimeList);
        assert_eq!(QueryKey::detail(21).kind(), ResourceKind::AnimeDetail);
    }

    #[test]
    fn test_query_key_next_page() {
        assert_eq!(QueryKey::list(1, "one piece").next_page(), Some(QueryKey::list(2, "one piece")));
        assert_eq!(QueryKey::detail(1).next_page(), None);
    }

    #[test]
    fn test_query_key_display() {
        assert_eq!(QueryKey::list(2, "naruto").to_string(), "animeList[2, \"naruto\"]");
        assert_eq!(QueryKey::detail(21).to_string(), "animeDetail[21]");
    }

    #[test]
    fn test_deserialize_summary_ignores_unknown_fields() {
        let json = r#"{
            "mal_id": 20,
            "title": "Naruto",
            "images": {"jpg": {"image_url": "https://cdn/n.jpg", "large_image_url": "https://cdn/n_l.jpg"}},
            "score": 8.0,
            "episodes": 220,
            "genres": [{"mal_id": 1, "name": "Action", "type": "anime"}],
            "broadcast": {"day": "Thursdays"}
        }"#;
        let anime: AnimeSummary = serde_json::from_str(json).unwrap();
        assert_eq!(anime.mal_id, 20);
        assert_eq!(anime.episodes, Some(220));
        assert_eq!(anime.genres[0].name, "Action");
        assert_eq!(anime.images.large(), Some("https://cdn/n_l.jpg"));
        assert!(anime.year.is_none());
    }

    #[test]
    fn test_images_large_falls_back_to_webp() {
        let images = Images {
            jpg: None,
            webp: Some(ImageUrls { large_image_url: Some("https://cdn/x.webp".into()), ..Default::default() }),
        };
        assert_eq!(images.large(), Some("https://cdn/x.webp"));
        assert_eq!(Images::default().large(), None);
    }

    #[test]
    fn test_deserialize_detail_flattens_summary() {
        let json = r#"{
            "mal_id": 21,
            "title": "One Piece",
            "synopsis": "Gol D. Roger was known as the Pirate King.",
            "popularity": 19,
            "studios": [{"mal_id": 18, "name": "Toei Animation"}]
        }"#;
        let detail: AnimeDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.summary.title, "One Piece");
        assert_eq!(detail.popularity, Some(19));
        assert_eq!(detail.studios.len(), 1);
    }

    #[test]
    fn test_synopsis_excerpt() {
        let json = r#"{"mal_id": 1, "title": "X", "synopsis": "one two three four five"}"#;
        let detail: AnimeDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.synopsis_excerpt(100).as_deref(), Some("one two three four five"));
        assert_eq!(detail.synopsis_excerpt(10).as_deref(), Some("one two..."));

        let json = r#"{"mal_id": 1, "title": "X"}"#;
        let detail: AnimeDetail = serde_json::from_str(json).unwrap();
        assert!(detail.synopsis_excerpt(10).is_none());
    }

    #[test]
    fn test_pagination_default() {
        let pagination = Pagination::default();
        assert_eq!(pagination.last_page, 1);
        assert!(!pagination.has_next);
        assert!(ListPayload::default().is_empty());
    }
}
