use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use animedex_client::{AnimeSource, ApiClient, ApiConfig, ApiError, QueryCache, QueryStatus, StalePolicy};
use animedex_core::QueryKey;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn list(State(seen): State<Seen>, Query(params): Query<HashMap<String, String>>) -> Response {
    let query = params.get("q").cloned().unwrap_or_default();
    seen.lock().unwrap().push(params);

    match query.as_str() {
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "data": [] })).into_response()
        }
        "throttle" => StatusCode::TOO_MANY_REQUESTS.into_response(),
        "broken" => (StatusCode::OK, "not json").into_response(),
        "nothing" => Json(json!({
            "pagination": { "last_visible_page": 1, "has_next_page": false },
            "data": []
        }))
        .into_response(),
        _ => Json(json!({
            "pagination": { "last_visible_page": 3, "has_next_page": true },
            "data": [
                { "mal_id": 20, "title": "Naruto", "score": 8.0, "episodes": 220 },
                { "mal_id": 1735, "title": "Naruto: Shippuuden", "score": 8.26, "episodes": 500 }
            ]
        }))
        .into_response(),
    }
}

async fn detail(Path(id): Path<u64>) -> Response {
    if id == 404 {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "data": {
            "mal_id": id,
            "title": "Cowboy Bebop",
            "synopsis": "Crime is timeless.",
            "studios": [{ "mal_id": 14, "name": "Sunrise" }],
            "rank": 46
        }
    }))
    .into_response()
}

async fn serve() -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/v4/anime", get(list))
        .route("/v4/anime/{id}", get(detail))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, seen)
}

fn client(addr: SocketAddr) -> ApiClient {
    ApiClient::new(ApiConfig { base_url: format!("http://{addr}/v4"), ..Default::default() }).unwrap()
}

#[tokio::test]
async fn list_sends_query_page_and_limit() {
    let (addr, seen) = serve().await;
    let client = client(addr);

    let page = client.fetch_list(2, "naruto").await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].mal_id, 1735);
    assert_eq!(page.pagination.last_page, 3);
    assert!(page.pagination.has_next);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].get("q").map(String::as_str), Some("naruto"));
    assert_eq!(seen[0].get("page").map(String::as_str), Some("2"));
    assert_eq!(seen[0].get("limit").map(String::as_str), Some("24"));
}

#[tokio::test]
async fn list_without_search_sends_empty_query() {
    let (addr, seen) = serve().await;
    client(addr).fetch_list(1, "").await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].get("q").map(String::as_str), Some(""));
}

#[tokio::test]
async fn empty_page_is_not_an_error() {
    let (addr, _) = serve().await;
    let page = client(addr).fetch_list(1, "nothing").await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn throttled_response_maps_to_http_error() {
    let (addr, _) = serve().await;
    let err = client(addr).fetch_list(1, "throttle").await.unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 429 }));
    assert!(err.is_throttled());
}

#[tokio::test]
async fn malformed_body_maps_to_parse_error() {
    let (addr, _) = serve().await;
    let err = client(addr).fetch_list(1, "broken").await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn detail_is_parsed() {
    let (addr, _) = serve().await;
    let anime = client(addr).fetch_detail(1).await.unwrap();

    assert_eq!(anime.summary.mal_id, 1);
    assert_eq!(anime.summary.title, "Cowboy Bebop");
    assert_eq!(anime.studios[0].name, "Sunrise");
    assert_eq!(anime.rank, Some(46));
}

#[tokio::test]
async fn missing_detail_maps_to_http_error() {
    let (addr, _) = serve().await;
    let err = client(addr).fetch_detail(404).await.unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 404 }));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let (addr, _) = serve().await;
    let config =
        ApiConfig { base_url: format!("http://{addr}/v4"), timeout: Duration::from_millis(200), ..Default::default() };
    let err = ApiClient::new(config).unwrap().fetch_list(1, "slow").await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout));
}

#[tokio::test]
async fn unreachable_upstream_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr).fetch_list(1, "").await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn cache_deduplicates_real_requests() {
    let (addr, seen) = serve().await;
    let cache = QueryCache::new(Arc::new(client(addr)), StalePolicy::default());
    let key = QueryKey::list(1, "naruto");

    let (first, second) = tokio::join!(cache.fetch(key.clone()), cache.fetch(key.clone()));
    assert_eq!(first.status, QueryStatus::Success);
    assert_eq!(second.status, QueryStatus::Success);

    cache.fetch(key).await;
    assert_eq!(seen.lock().unwrap().len(), 1);
}
