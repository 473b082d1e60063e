//! List screen controller.
//!
//! Derives what the list screen should show from the query cache and turns
//! user actions into `Intent`s. It performs no fetching of its own beyond
//! asking the cache for the active key and, once that key resolves with a
//! next page, prefetching it.

use std::sync::Arc;

use animedex_core::{Intent, ListPayload, PageState, QueryKey};

use crate::query::{QueryCache, QueryStatus};

/// Pagination controls for a populated page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageControls {
    pub current: u32,
    pub total: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Render mode of the list screen.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    /// Nothing to show for the active key yet. `placeholder` is the previous
    /// key's data, shown only together with a loading indicator.
    Loading { placeholder: Option<Arc<ListPayload>> },
    /// The last attempt failed. Offers a retry.
    Error { message: String, throttled: bool },
    /// Successful with zero items. With an active search this offers clearing it.
    Empty { search: Option<String> },
    /// Successful with items. `fetching` is set while a stale page refetches.
    Populated { page: Arc<ListPayload>, controls: PageControls, fetching: bool },
}

/// Controller for the paginated, searchable anime list.
pub struct ListController {
    cache: Arc<QueryCache>,
    state: PageState,
    committed_search: String,
    active: QueryKey,
    placeholder: Option<Arc<ListPayload>>,
    prefetched_for: Option<QueryKey>,
}

impl ListController {
    /// Mount with the state read from the location. The initial search term
    /// is committed immediately.
    pub fn new(cache: Arc<QueryCache>, state: PageState) -> Self {
        let active = QueryKey::list(state.page(), state.search.clone());
        Self {
            cache,
            committed_search: state.search.clone(),
            state,
            active,
            placeholder: None,
            prefetched_for: None,
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Search term the active key was built from.
    pub fn committed_search(&self) -> &str {
        &self.committed_search
    }

    pub fn active_key(&self) -> &QueryKey {
        &self.active
    }

    /// Adopt state read from the location.
    ///
    /// The page takes effect immediately. Returns `true` when the search term
    /// differs from the committed one and must go through the debouncer.
    pub fn sync_from_url(&mut self, state: PageState) -> bool {
        let search_changed = state.search != self.committed_search;
        self.state = state;
        self.rekey();
        search_changed
    }

    /// A debounced search term arrived.
    pub fn commit_search(&mut self, search: String) {
        if search == self.committed_search {
            return;
        }
        tracing::debug!(search = %search, "search committed");
        self.committed_search = search;
        self.rekey();
    }

    /// Whether the active key should be handed to the cache.
    pub fn needs_fetch(&self) -> bool {
        self.cache.needs_fetch(&self.active)
    }

    /// A fetch for `key` finished.
    ///
    /// Returns `false` and ignores the result when `key` is no longer active.
    /// For the active key, remembers its data as the next placeholder and
    /// prefetches the following page once.
    pub fn on_resolved(&mut self, key: &QueryKey) -> bool {
        if key != &self.active {
            tracing::debug!(key = %key, active = %self.active, "discarding superseded response");
            return false;
        }

        let Some(entry) = self.cache.peek(key) else {
            return true;
        };
        if entry.status != QueryStatus::Success {
            return true;
        }

        if let Some(list) = entry.list() {
            self.placeholder = Some(Arc::clone(list));
            if list.pagination.has_next
                && self.prefetched_for.as_ref() != Some(key)
                && let Some(next) = key.next_page()
            {
                self.prefetched_for = Some(key.clone());
                self.cache.prefetch(next);
            }
        }
        true
    }

    /// Fetch the active key and derive the resulting view.
    pub async fn refresh(&mut self) -> ListView {
        let key = self.active.clone();
        self.cache.fetch(key.clone()).await;
        self.on_resolved(&key);
        self.view()
    }

    /// Derive the render mode for the active key.
    pub fn view(&self) -> ListView {
        let Some(entry) = self.cache.peek(&self.active) else {
            return ListView::Loading { placeholder: self.placeholder.clone() };
        };

        if entry.status == QueryStatus::Error {
            let message = entry
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "Failed to load anime data. Please try again.".to_string());
            return ListView::Error { message, throttled: entry.is_throttled() };
        }

        if entry.is_loading() {
            return ListView::Loading { placeholder: self.placeholder.clone() };
        }

        let Some(list) = entry.list() else {
            return ListView::Loading { placeholder: self.placeholder.clone() };
        };

        if list.is_empty() {
            let search = (!self.committed_search.is_empty()).then(|| self.committed_search.clone());
            return ListView::Empty { search };
        }

        let current = self.state.page();
        let total = list.pagination.last_page.max(current);
        ListView::Populated {
            page: Arc::clone(list),
            controls: PageControls {
                current,
                total,
                has_prev: current > 1,
                has_next: list.pagination.has_next,
            },
            fetching: entry.is_fetching(),
        }
    }

    pub fn on_page_change(&self, page: u32) -> Intent {
        Intent::ChangePage(page.max(1))
    }

    pub fn on_search_change(&self, search: impl Into<String>) -> Intent {
        Intent::ChangeSearch(search.into())
    }

    pub fn on_retry(&self) -> Intent {
        Intent::Retry(self.active.clone())
    }

    pub fn on_reset_search(&self) -> Intent {
        Intent::ResetSearch
    }

    pub fn on_open(&self, id: u64) -> Intent {
        Intent::OpenDetail(id)
    }

    fn rekey(&mut self) {
        let key = QueryKey::list(self.state.page(), self.committed_search.clone());
        if key == self.active {
            return;
        }

        if let Some(list) = self.cache.peek(&self.active).as_ref().and_then(|e| e.list().cloned()) {
            self.placeholder = Some(list);
        }
        tracing::debug!(from = %self.active, to = %key, "active list key changed");
        self.active = key;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use animedex_core::UrlSync;

    use super::*;
    use crate::api::ApiError;
    use crate::query::StalePolicy;
    use crate::query::testing::{FakeSource, page};

    fn setup(source: &Arc<FakeSource>, location: &str) -> (UrlSync, ListController) {
        let cache = Arc::new(QueryCache::new(source.clone(), StalePolicy::default()));
        let sync = UrlSync::parse(location).unwrap();
        let controller = ListController::new(cache, sync.read_from_url());
        (sync, controller)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_view_is_loading() {
        let source = Arc::new(FakeSource::default());
        let (_, controller) = setup(&source, "http://localhost/");
        assert_eq!(controller.view(), ListView::Loading { placeholder: None });
        assert!(controller.needs_fetch());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_search_scenario() {
        let source = Arc::new(FakeSource::default());
        source.set_page(1, "naruto", Ok(page(&[], 1, false)));
        let (mut sync, mut controller) = setup(&source, "http://localhost/?search=naruto&page=1");

        let view = controller.refresh().await;
        assert_eq!(source.list_calls(), vec![(1, "naruto".to_string())]);
        assert_eq!(view, ListView::Empty { search: Some("naruto".to_string()) });

        let intent = controller.on_reset_search();
        assert!(sync.apply(&intent).unwrap());
        assert_eq!(sync.location().query(), Some("page=1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_without_search() {
        let source = Arc::new(FakeSource::default());
        let (_, mut controller) = setup(&source, "http://localhost/");
        assert_eq!(controller.refresh().await, ListView::Empty { search: None });
    }

    #[tokio::test(start_paused = true)]
    async fn test_populated_view() {
        let source = Arc::new(FakeSource::default());
        source.set_page(2, "", Ok(page(&["A", "B"], 5, true)));
        let (_, mut controller) = setup(&source, "http://localhost/?page=2");

        match controller.refresh().await {
            ListView::Populated { page, controls, fetching } => {
                assert_eq!(page.items.len(), 2);
                assert_eq!(controls, PageControls { current: 2, total: 5, has_prev: true, has_next: true });
                assert!(!fetching);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_has_next_prefetches_once() {
        let source = Arc::new(FakeSource::default());
        source.set_page(1, "naruto", Ok(page(&["Naruto"], 3, true)));
        let (_, mut controller) = setup(&source, "http://localhost/?search=naruto&page=1");

        controller.refresh().await;
        let key = controller.active_key().clone();
        controller.on_resolved(&key);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(source.list_calls(), vec![(1, "naruto".to_string()), (2, "naruto".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_page_does_not_prefetch() {
        let source = Arc::new(FakeSource::default());
        source.set_page(1, "", Ok(page(&["A"], 1, false)));
        let (_, mut controller) = setup(&source, "http://localhost/");

        controller.refresh().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.list_call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_error_view_and_retry() {
        let source = Arc::new(FakeSource::default());
        source.set_page(1, "", Err(ApiError::HttpError { status: 429 }));
        let (mut sync, mut controller) = setup(&source, "http://localhost/");

        let view = controller.refresh().await;
        assert!(matches!(view, ListView::Error { throttled: true, .. }));
        assert!(!controller.needs_fetch());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.list_call_count(), 1);

        let intent = controller.on_retry();
        assert_eq!(intent, Intent::Retry(QueryKey::list(1, "")));
        assert!(!sync.apply(&intent).unwrap());

        source.set_page(1, "", Ok(page(&["A"], 1, false)));
        let view = controller.refresh().await;
        assert!(matches!(view, ListView::Populated { .. }));
        assert_eq!(source.list_call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_response_is_discarded() {
        let source = Arc::new(FakeSource::default());
        source.set_page(1, "", Ok(page(&["Old"], 2, true)));
        let (_, mut controller) = setup(&source, "http://localhost/");
        let stale_key = controller.active_key().clone();

        controller.sync_from_url(PageState::new(2, ""));
        controller.cache.fetch(stale_key.clone()).await;

        assert!(!controller.on_resolved(&stale_key));
        assert_eq!(controller.view(), ListView::Loading { placeholder: None });
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.list_call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_placeholder_while_next_page_loads() {
        let source = Arc::new(FakeSource::with_latency(Duration::from_millis(100)));
        source.set_page(1, "", Ok(page(&["A"], 3, false)));
        let (mut sync, mut controller) = setup(&source, "http://localhost/");
        controller.refresh().await;

        let intent = controller.on_page_change(2);
        sync.apply(&intent).unwrap();
        controller.sync_from_url(sync.read_from_url());

        match controller.view() {
            ListView::Loading { placeholder: Some(previous) } => assert_eq!(previous.items[0].title, "A"),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_goes_through_commit() {
        let source = Arc::new(FakeSource::default());
        let (mut sync, mut controller) = setup(&source, "http://localhost/?page=3");

        let intent = controller.on_search_change("bleach");
        sync.apply(&intent).unwrap();
        assert!(controller.sync_from_url(sync.read_from_url()));
        assert_eq!(controller.active_key(), &QueryKey::list(1, ""));

        controller.commit_search("bleach".to_string());
        assert_eq!(controller.active_key(), &QueryKey::list(1, "bleach"));
        assert!(!controller.sync_from_url(sync.read_from_url()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_needs_fetch_after_staleness() {
        let source = Arc::new(FakeSource::default());
        let (_, mut controller) = setup(&source, "http://localhost/");
        controller.refresh().await;
        assert!(!controller.needs_fetch());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(controller.needs_fetch());
    }

    #[test]
    fn test_page_change_intent_clamps() {
        let source = Arc::new(FakeSource::default());
        let cache = Arc::new(QueryCache::new(source, StalePolicy::default()));
        let controller = ListController::new(cache, PageState::default());
        assert_eq!(controller.on_page_change(0), Intent::ChangePage(1));
        assert_eq!(controller.on_open(20), Intent::OpenDetail(20));
    }
}
