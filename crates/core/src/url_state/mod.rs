//! Two-way mapping between the location's query string and `PageState`.
//!
//! The synchronizer owns only the URL side. It never fetches and it never
//! pushes history entries for list state: page and search rewrites replace the
//! current entry so back-navigation skips over them. Detail navigation is the
//! one operation that pushes.
//!
//! ### Parameters
//!
//! - `search`: free text, omitted when empty
//! - `page`: positive integer, defaults to 1
//!
//! Unrelated parameters are preserved in their original order.

pub mod history;

pub use history::History;

use url::Url;

use crate::Error;
use crate::intent::Intent;
use crate::types::PageState;

pub const PAGE_PARAM: &str = "page";
pub const SEARCH_PARAM: &str = "search";

/// Screen addressed by a location path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    AnimeList,
    AnimeDetail(u64),
    NotFound,
}

impl Route {
    /// Resolve a location: `/` or `/anime` is the list, `/anime/{id}` a detail.
    pub fn from_url(url: &Url) -> Self {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [] | ["anime"] => Route::AnimeList,
            ["anime", id] => id.parse().map(Route::AnimeDetail).unwrap_or(Route::NotFound),
            _ => Route::NotFound,
        }
    }
}

/// Keeps `PageState` and the current history entry consistent.
#[derive(Debug, Clone)]
pub struct UrlSync {
    history: History,
}

impl UrlSync {
    pub fn new(history: History) -> Self {
        Self { history }
    }

    /// Start from an absolute location string such as
    /// `http://localhost/?search=naruto&page=2`.
    pub fn parse(location: &str) -> Result<Self, Error> {
        History::parse(location).map(Self::new)
    }

    pub fn location(&self) -> &Url {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn route(&self) -> Route {
        Route::from_url(self.location())
    }

    /// Parse the current location into a `PageState`.
    pub fn read_from_url(&self) -> PageState {
        state_from_url(self.location())
    }

    /// Serialize `state` into the current entry, replacing it.
    ///
    /// Callers pass `reset_page = true` whenever the search term changed.
    /// Returns the state that was actually written.
    pub fn write_to_url(&mut self, state: &PageState, reset_page: bool) -> PageState {
        let state = if reset_page { state.clone().with_page(1) } else { state.clone() };
        let url = encode_state(self.location(), &state);
        tracing::debug!(location = %url, "replacing location");
        self.history.replace(url);
        state
    }

    /// Drop the `search` parameter and go back to page 1.
    pub fn clear(&mut self) -> PageState {
        self.write_to_url(&PageState::default(), true)
    }

    /// Push a detail location for the given anime.
    pub fn open_detail(&mut self, id: u64) -> Result<(), Error> {
        let url = self
            .location()
            .join(&format!("/anime/{id}"))
            .map_err(|e| Error::InvalidLocation(e.to_string()))?;
        tracing::debug!(location = %url, "pushing location");
        self.history.push(url);
        Ok(())
    }

    /// External navigation: step back one history entry.
    pub fn back(&mut self) -> bool {
        self.history.back()
    }

    /// External navigation: step forward one history entry.
    pub fn forward(&mut self) -> bool {
        self.history.forward()
    }

    /// Rewrite unknown routes to the list root. Returns `true` if the
    /// location changed.
    pub fn normalize_route(&mut self) -> bool {
        if self.route() != Route::NotFound {
            return false;
        }
        let mut url = self.location().clone();
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);
        tracing::debug!(location = %url, "unknown route, redirecting to list");
        self.history.replace(url);
        true
    }

    /// Apply the location-changing part of an intent.
    ///
    /// Returns `true` if the current location changed. `Retry` never touches
    /// the location and is left to the caller.
    pub fn apply(&mut self, intent: &Intent) -> Result<bool, Error> {
        let before = self.location().clone();
        match intent {
            Intent::ChangePage(page) => {
                let state = self.read_from_url().with_page(i64::from(*page));
                self.write_to_url(&state, false);
            }
            Intent::ChangeSearch(search) => {
                let state = self.read_from_url().with_search(search.clone());
                self.write_to_url(&state, true);
            }
            Intent::ResetSearch => {
                self.clear();
            }
            Intent::OpenDetail(id) => {
                self.open_detail(*id)?;
                return Ok(true);
            }
            Intent::GoBack => return Ok(self.back()),
            Intent::Retry(_) => return Ok(false),
        }
        Ok(self.location() != &before)
    }
}

/// Parse `search` and `page` from a location. The first occurrence of each
/// parameter wins.
pub fn state_from_url(url: &Url) -> PageState {
    let search = url
        .query_pairs()
        .find(|(key, _)| key == SEARCH_PARAM)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();
    let page = url
        .query_pairs()
        .find(|(key, _)| key == PAGE_PARAM)
        .map(|(_, value)| PageState::parse_page(&value))
        .unwrap_or(1);

    PageState::new(i64::from(page), search)
}

fn encode_state(base: &Url, state: &PageState) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM && key != SEARCH_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(kept);
        if state.search_active() {
            pairs.append_pair(SEARCH_PARAM, &state.search);
        }
        pairs.append_pair(PAGE_PARAM, &state.page().to_string());
    }
    url
}
