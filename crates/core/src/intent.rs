//! Commands returned by view controllers.
//!
//! Controllers never touch the location or the cache directly in response to
//! user input; they hand back an `Intent` and the shell applies it to the
//! `UrlSync` (and, for retries, to the query cache).

use crate::types::QueryKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Move to another page of the current search.
    ChangePage(u32),
    /// Raw search input changed. Resets pagination.
    ChangeSearch(String),
    /// Drop the search term and return to page 1.
    ResetSearch,
    /// Re-fetch a key whose last attempt failed.
    Retry(QueryKey),
    /// Navigate to the detail screen of an anime.
    OpenDetail(u64),
    /// Navigate back one history entry.
    GoBack,
}

impl Intent {
    /// Whether applying this intent rewrites the location.
    pub fn touches_location(&self) -> bool {
        !matches!(self, Intent::Retry(_))
    }
}
