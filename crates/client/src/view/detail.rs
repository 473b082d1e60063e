//! Detail screen controller.

use std::sync::Arc;

use animedex_core::{AnimeDetail, Intent, QueryKey};

use crate::query::{QueryCache, QueryStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Loading,
    Error { message: String, throttled: bool },
    Loaded(Arc<AnimeDetail>),
}

/// Controller for a single anime record.
pub struct DetailController {
    cache: Arc<QueryCache>,
    key: QueryKey,
}

impl DetailController {
    pub fn new(cache: Arc<QueryCache>, id: u64) -> Self {
        Self { cache, key: QueryKey::detail(id) }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn needs_fetch(&self) -> bool {
        self.cache.needs_fetch(&self.key)
    }

    /// Fetch the record through the cache and derive the view.
    pub async fn load(&self) -> DetailView {
        self.cache.fetch(self.key.clone()).await;
        self.view()
    }

    /// Whether a result for `key` concerns this screen.
    pub fn on_resolved(&self, key: &QueryKey) -> bool {
        key == &self.key
    }

    pub fn view(&self) -> DetailView {
        let Some(entry) = self.cache.peek(&self.key) else {
            return DetailView::Loading;
        };

        if entry.status == QueryStatus::Error {
            let message = entry.error.as_ref().map(ToString::to_string).unwrap_or_default();
            return DetailView::Error { message, throttled: entry.is_throttled() };
        }

        match entry.detail() {
            Some(detail) => DetailView::Loaded(Arc::clone(detail)),
            None => DetailView::Loading,
        }
    }

    pub fn on_retry(&self) -> Intent {
        Intent::Retry(self.key.clone())
    }

    pub fn on_go_back(&self) -> Intent {
        Intent::GoBack
    }
}
