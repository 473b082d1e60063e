//! Cache entry snapshots and the staleness policy.

use std::sync::Arc;
use std::time::Duration;

use animedex_core::{AnimeDetail, AppConfig, ListPayload, QueryKey, ResourceKind};
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::api::ApiError;

/// Default freshness window for list pages.
pub const LIST_STALE_TIME: Duration = Duration::from_millis(5_000);

/// Default freshness window for detail records.
pub const DETAIL_STALE_TIME: Duration = Duration::from_millis(600_000);

/// Resolved data of a query. Shared, never copied.
#[derive(Debug, Clone)]
pub enum Payload {
    List(Arc<ListPayload>),
    Detail(Arc<AnimeDetail>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never requested.
    Idle,
    /// A request is in flight. Earlier data, if any, is still attached.
    Loading,
    Success,
    Error,
}

/// Point-in-time copy of one cache slot.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: QueryKey,
    pub status: QueryStatus,
    pub data: Option<Payload>,
    pub error: Option<ApiError>,
    /// Monotonic time of the last success, used for staleness.
    pub fetched_at: Option<Instant>,
    /// Wall-clock time of the last success, for display.
    pub updated_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn idle(key: QueryKey) -> Self {
        Self { key, status: QueryStatus::Idle, data: None, error: None, fetched_at: None, updated_at: None }
    }

    /// Loading with nothing to show yet. Authoritative over `status` when
    /// deciding whether to render a loading screen.
    pub fn is_loading(&self) -> bool {
        matches!(self.status, QueryStatus::Idle | QueryStatus::Loading) && self.data.is_none()
    }

    /// A request is in flight, with or without earlier data.
    pub fn is_fetching(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Last failure was an HTTP 429.
    pub fn is_throttled(&self) -> bool {
        self.error.as_ref().is_some_and(ApiError::is_throttled)
    }

    /// Holds successful data younger than the policy's window for this key.
    pub fn is_fresh(&self, now: Instant, policy: &StalePolicy) -> bool {
        self.status == QueryStatus::Success
            && self
                .fetched_at
                .is_some_and(|at| now.saturating_duration_since(at) < policy.window(self.key.kind()))
    }

    pub fn list(&self) -> Option<&Arc<ListPayload>> {
        match &self.data {
            Some(Payload::List(list)) => Some(list),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&Arc<AnimeDetail>> {
        match &self.data {
            Some(Payload::Detail(detail)) => Some(detail),
            _ => None,
        }
    }
}

/// How long successful data is served without a network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalePolicy {
    pub list: Duration,
    pub detail: Duration,
}

impl Default for StalePolicy {
    fn default() -> Self {
        Self { list: LIST_STALE_TIME, detail: DETAIL_STALE_TIME }
    }
}

impl From<&AppConfig> for StalePolicy {
    fn from(config: &AppConfig) -> Self {
        Self { list: config.list_stale(), detail: config.detail_stale() }
    }
}

impl StalePolicy {
    pub fn window(&self, kind: ResourceKind) -> Duration {
        match kind {
            ResourceKind::AnimeList => self.list,
            ResourceKind::AnimeDetail => self.detail,
        }
    }
}
