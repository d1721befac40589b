//! Caching client behaviour against a scripted in-process origin.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};
use http::header::{CACHE_CONTROL, ETAG, EXPIRES, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use http::{HeaderMap, Request, Response, StatusCode};
use http_body_util::Full;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use revalbox::store::{MemoryStore, Store, StoreError, StoreResult};
use revalbox::{CacheEntry, CacheError, CacheKey, CacheStatus, CachingClient, ResponseStatus, Transport};

const URL: &str = "http://origin.test/resource";
const LAST_MODIFIED_VALUE: &str = "Mon, 02 Jan 2006 15:04:05 GMT";

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
struct Refused;

impl From<Infallible> for Refused {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

type Handler = dyn Fn(&Request<Bytes>) -> Result<Response<Full<Bytes>>, Refused> + Send + Sync;

/// Origin answering from a closure and recording the headers of every request.
struct Origin {
    handler: Box<Handler>,
    requests: Mutex<Vec<HeaderMap>>,
}

impl Origin {
    fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Request<Bytes>) -> Result<Response<Full<Bytes>>, Refused> + Send + Sync + 'static,
    {
        Arc::new(Origin {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    fn last_request(&self) -> HeaderMap {
        self.requests.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Transport for Origin {
    type Body = Full<Bytes>;
    type Error = Refused;

    async fn send(&self, request: Request<Bytes>) -> Result<Response<Full<Bytes>>, Refused> {
        self.requests.lock().push(request.headers().clone());
        (self.handler)(&request)
    }
}

fn ok(headers: &[(http::header::HeaderName, &str)], body: &'static str) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(StatusCode::OK);
    for (name, value) in headers {
        builder = builder.header(name, *value);
    }
    builder.body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap()
}

fn not_modified() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn http_date(time: chrono::DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[tokio::test]
async fn response_without_validators_is_not_cached() {
    let origin = Origin::new(|_| Ok(ok(&[], "Hello, client")));
    let client = CachingClient::new(origin.clone());

    for _ in 0..2 {
        let response = client.fetch_with_cache(URL).await.unwrap();
        assert_eq!(response.status, ResponseStatus::Network(StatusCode::OK));
        assert_eq!(response.cache, CacheStatus::Miss);
        assert_eq!(response.body, Bytes::from_static(b"Hello, client"));
    }

    assert!(client.store().is_empty());
    assert_eq!(origin.calls(), 2);
}

#[tokio::test]
async fn max_age_entry_is_served_from_cache() {
    let origin = Origin::new(|_| Ok(ok(&[(CACHE_CONTROL, "public, max-age=60")], "fresh")));
    let client = CachingClient::new(origin.clone());

    let first = client.fetch_with_cache(URL).await.unwrap();
    assert_eq!(first.cache, CacheStatus::Miss);
    assert_eq!(client.store().len(), 1);

    let second = client.fetch_with_cache(URL).await.unwrap();
    assert!(second.is_cache_hit());
    assert_eq!(second.status.as_u16(), ResponseStatus::CACHE_CONTENT_CODE);
    assert_eq!(second.body, first.body);
    assert!(second.headers.is_empty());
    assert_eq!(origin.calls(), 1);
}

#[tokio::test]
async fn expires_short_circuits_the_network() {
    let expires = http_date(Utc::now() + Duration::seconds(10));
    let origin = Origin::new(move |_| Ok(ok(&[(EXPIRES, expires.as_str())], "Hello, client")));
    let client = CachingClient::new(origin.clone());

    let first = client.fetch_with_cache(URL).await.unwrap();
    let (_, entry) = client.store().entries().pop().unwrap();
    assert!(entry.expires_at().is_some());

    let second = client.fetch_with_cache(URL).await.unwrap();
    assert_eq!(second.status, ResponseStatus::Cached);
    assert_eq!(second.body, first.body);
    assert_eq!(client.store().len(), 1);
    assert_eq!(origin.calls(), 1);
}

#[tokio::test]
async fn expired_sentinel_is_not_cached() {
    let origin = Origin::new(|_| Ok(ok(&[(EXPIRES, "-1")], "volatile")));
    let client = CachingClient::new(origin.clone());

    client.fetch_with_cache(URL).await.unwrap();
    assert!(client.store().is_empty());
}

#[tokio::test]
async fn etag_is_revalidated_with_if_none_match() {
    let origin = Origin::new(|request| {
        if request.headers().get(IF_NONE_MATCH).is_some_and(|v| v == "\"v1\"") {
            Ok(not_modified())
        } else {
            Ok(ok(&[(ETAG, "\"v1\"")], "Hello, client"))
        }
    });
    let client = CachingClient::new(origin.clone());

    let first = client.fetch_with_cache(URL).await.unwrap();
    assert_eq!(first.cache, CacheStatus::Miss);
    assert!(origin.last_request().get(IF_NONE_MATCH).is_none());
    let stored = client.store().entries();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].1.etag(), Some("\"v1\""));
    assert_eq!(stored[0].1.last_modified(), None);

    let second = client.fetch_with_cache(URL).await.unwrap();
    assert_eq!(origin.last_request()[IF_NONE_MATCH], "\"v1\"");
    assert_eq!(second.status, ResponseStatus::Network(StatusCode::NOT_MODIFIED));
    assert_eq!(second.cache, CacheStatus::Revalidated);
    assert_eq!(second.body, Bytes::from_static(b"Hello, client"));
    assert_eq!(client.store().entries(), stored);
}

#[tokio::test]
async fn last_modified_is_revalidated_with_if_modified_since() {
    let origin = Origin::new(|request| {
        if request.headers().contains_key(IF_MODIFIED_SINCE) {
            Ok(not_modified())
        } else {
            Ok(ok(&[(LAST_MODIFIED, LAST_MODIFIED_VALUE)], "dated"))
        }
    });
    let client = CachingClient::new(origin.clone());

    client.fetch_with_cache(URL).await.unwrap();
    let stored = client.store().entries();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].1.last_modified(), Some(LAST_MODIFIED_VALUE));
    assert_eq!(stored[0].1.etag(), None);
    assert_eq!(stored[0].1.expires_at(), None);

    let second = client.fetch_with_cache(URL).await.unwrap();

    let sent = origin.last_request();
    assert_eq!(sent[IF_MODIFIED_SINCE], LAST_MODIFIED_VALUE);
    assert!(!sent.contains_key(IF_NONE_MATCH));
    assert_eq!(second.cache, CacheStatus::Revalidated);
    assert_eq!(second.body, Bytes::from_static(b"dated"));
}

#[tokio::test]
async fn stale_entry_with_etag_is_revalidated() {
    let origin = Origin::new(|request| {
        if request.headers().contains_key(IF_NONE_MATCH) {
            Ok(not_modified())
        } else {
            Ok(ok(&[], "from origin"))
        }
    });
    let client = CachingClient::new(origin.clone());

    let key = client
        .key_deriver()
        .derive(&Request::get(URL).body(()).unwrap());
    let stale = CacheEntry::new(
        Bytes::from_static(b"cached body"),
        Some("\"v1\"".to_owned()),
        None,
        Some(Utc::now() - Duration::seconds(30)),
    );
    client.store().save(&key, stale.clone()).await.unwrap();

    let response = client.fetch_with_cache(URL).await.unwrap();

    assert_eq!(origin.calls(), 1);
    let sent = origin.last_request();
    assert_eq!(sent[IF_NONE_MATCH], "\"v1\"");
    assert!(!sent.contains_key(IF_MODIFIED_SINCE));
    assert_eq!(response.status, ResponseStatus::Network(StatusCode::NOT_MODIFIED));
    assert_eq!(response.cache, CacheStatus::Revalidated);
    assert_eq!(response.body, Bytes::from_static(b"cached body"));
    assert_eq!(client.store().entries(), vec![(key, stale)]);
}

#[tokio::test]
async fn changed_resource_replaces_entry() {
    let version = Arc::new(Mutex::new("v1"));
    let current = version.clone();
    let origin = Origin::new(move |request| {
        let etag = format!("\"{}\"", *current.lock());
        if request.headers().get(IF_NONE_MATCH).is_some_and(|v| v == etag.as_str()) {
            return Ok(not_modified());
        }
        let body = if etag == "\"v1\"" { "first" } else { "second" };
        Ok(ok(&[(ETAG, etag.as_str())], body))
    });
    let client = CachingClient::new(origin.clone());

    client.fetch_with_cache(URL).await.unwrap();
    *version.lock() = "v2";
    let second = client.fetch_with_cache(URL).await.unwrap();

    assert_eq!(second.cache, CacheStatus::Miss);
    assert_eq!(second.body, Bytes::from_static(b"second"));
    let stored = client.store().entries();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].1.etag(), Some("\"v2\""));
}

#[tokio::test]
async fn repeated_fetches_keep_one_entry() {
    let origin = Origin::new(|_| Ok(ok(&[(ETAG, "\"stable\"")], "same")));
    let client = CachingClient::new(origin.clone());

    for _ in 0..5 {
        let response = client.fetch_with_cache(URL).await.unwrap();
        assert_eq!(response.body, Bytes::from_static(b"same"));
    }

    assert_eq!(client.store().len(), 1);
    assert_eq!(origin.calls(), 5);
}

#[tokio::test]
async fn not_modified_without_entry_is_returned_as_is() {
    let origin = Origin::new(|_| Ok(not_modified()));
    let client = CachingClient::new(origin.clone());

    let response = client.fetch_with_cache(URL).await.unwrap();
    assert_eq!(response.status, ResponseStatus::Network(StatusCode::NOT_MODIFIED));
    assert_eq!(response.cache, CacheStatus::Miss);
    assert!(response.body.is_empty());
    assert!(client.store().is_empty());
}

#[tokio::test]
async fn transport_error_is_passed_through() {
    let origin = Origin::new(|_| Err(Refused));
    let client = CachingClient::new(origin.clone());

    let error = client.fetch_with_cache(URL).await.unwrap_err();
    assert!(error.is_transport());
    assert_eq!(error.to_string(), "connection refused");
    assert!(client.store().is_empty());
}

#[tokio::test]
async fn invalid_urls_fail_before_any_io() {
    let origin = Origin::new(|_| Ok(ok(&[(ETAG, "\"x\"")], "")));
    let client = CachingClient::new(origin.clone());

    let error = client.fetch_with_cache("not a url").await.unwrap_err();
    assert!(matches!(error, CacheError::InvalidRequest(_)));

    let error = client.fetch_with_cache("/relative/path").await.unwrap_err();
    assert!(matches!(error, CacheError::RelativeUrl(_)));

    assert_eq!(origin.calls(), 0);
}

#[tokio::test]
async fn request_headers_are_part_of_the_key() {
    let origin = Origin::new(|_| Ok(ok(&[(ETAG, "\"x\"")], "negotiated")));
    let client = CachingClient::new(origin.clone());

    for accept in ["text/html", "application/json"] {
        let request = Request::get(URL)
            .header("accept", accept)
            .body(Bytes::new())
            .unwrap();
        client.fetch_request_with_cache(request).await.unwrap();
    }

    assert_eq!(client.store().len(), 2);
}

/// Store whose every operation fails.
struct Broken;

#[async_trait]
impl Store for Broken {
    async fn get(&self, _key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        Err(StoreError::ConnectionError(Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "store down",
        ))))
    }

    async fn save(&self, _key: &CacheKey, _entry: CacheEntry) -> StoreResult<()> {
        Err(StoreError::InternalError("read only".into()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

#[tokio::test]
async fn store_faults_fall_back_to_the_network() {
    let origin = Origin::new(|_| Ok(ok(&[(CACHE_CONTROL, "max-age=60")], "still served")));
    let client = CachingClient::with_store(origin.clone(), Broken);

    for _ in 0..2 {
        let response = client.fetch_with_cache(URL).await.unwrap();
        assert_eq!(response.status, ResponseStatus::Network(StatusCode::OK));
        assert_eq!(response.body, Bytes::from_static(b"still served"));
    }
    assert_eq!(origin.calls(), 2);
}

#[tokio::test]
async fn clients_can_share_a_store() {
    let store = MemoryStore::new();
    let origin = Origin::new(|_| Ok(ok(&[(CACHE_CONTROL, "max-age=60")], "shared")));
    let writer = CachingClient::with_store(origin.clone(), store.clone());
    let reader = CachingClient::builder()
        .transport(origin.clone())
        .store(store.clone())
        .build();

    writer.fetch_with_cache(URL).await.unwrap();
    let response = reader.fetch_with_cache(URL).await.unwrap();

    assert!(response.is_cache_hit());
    assert_eq!(origin.calls(), 1);
}
