//! Upstream response envelopes and their normalization.

use animedex_core::{AnimeDetail, AnimeSummary, ListPayload, Pagination};
use serde::Deserialize;

/// Raw `GET /anime` body.
#[derive(Debug, Deserialize)]
pub struct ListEnvelope {
    /// Missing or null `data` is treated as an empty page.
    #[serde(default)]
    pub data: Option<Vec<AnimeSummary>>,
    #[serde(default)]
    pub pagination: Option<RawPagination>,
}

#[derive(Debug, Deserialize)]
pub struct RawPagination {
    #[serde(default)]
    pub last_visible_page: u32,
    #[serde(default)]
    pub has_next_page: bool,
}

/// Raw `GET /anime/{id}` body.
#[derive(Debug, Deserialize)]
pub struct DetailEnvelope {
    pub data: AnimeDetail,
}

impl From<ListEnvelope> for ListPayload {
    fn from(raw: ListEnvelope) -> Self {
        let pagination = raw
            .pagination
            .map(|p| Pagination { last_page: p.last_visible_page.max(1), has_next: p.has_next_page })
            .unwrap_or_default();

        ListPayload { items: raw.data.unwrap_or_default(), pagination }
    }
}

impl From<DetailEnvelope> for AnimeDetail {
    fn from(raw: DetailEnvelope) -> Self {
        raw.data
    }
}
