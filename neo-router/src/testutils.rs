use crate::config::UpstreamConfig;
use crate::upstream::{
    DetailsResponse, NeoEntry, UpstreamClient, UpstreamError, UpstreamFailure, UpstreamResult,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use favourites::AsteroidId;
use http::StatusCode;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

/// Serves `router` on a random local port and returns its base URL.
pub async fn start_mock_upstream(router: axum::Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap()
}

pub fn upstream_config(url: Url, api_key: &str) -> UpstreamConfig {
    UpstreamConfig {
        url,
        api_key: api_key.to_string(),
        timeout_secs: 5,
        max_concurrent_requests: 4,
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn entries(records: &[(&str, AsteroidId)]) -> Vec<NeoEntry> {
    records
        .iter()
        .map(|(name, id)| NeoEntry {
            id: *id,
            name: name.to_string(),
        })
        .collect()
}

/// What the fake upstream answers for one window
pub enum Scripted {
    /// Success with every entry grouped under the window's start date
    Found(Vec<NeoEntry>),
    /// Success with entries spread over several dates
    Grouped(BTreeMap<String, Vec<NeoEntry>>),
    /// Success without any date groups
    Empty,
    Failed(UpstreamFailure),
    TransportError,
    /// Never completes
    Hang,
}

pub fn failure(code: i64, message: &str) -> UpstreamFailure {
    UpstreamFailure {
        code,
        http_error: "BAD_REQUEST".to_string(),
        message: message.to_string(),
        request: "http://upstream.test/neo/rest/v1/feed".to_string(),
    }
}

/// Upstream fake scripted per window start date.
///
/// Unscripted windows succeed with no entries. Tracks how many calls are in
/// flight so tests can check the concurrency bound and cancellation.
#[derive(Default)]
pub struct FakeUpstream {
    windows: HashMap<NaiveDate, (Duration, Scripted)>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    details_calls: AtomicUsize,
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, start: &str, delay_ms: u64, scripted: Scripted) -> Self {
        self.windows
            .insert(date(start), (Duration::from_millis(delay_ms), scripted));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn details_calls(&self) -> usize {
        self.details_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamClient for FakeUpstream {
    async fn search_by_range(
        &self,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<UpstreamResult, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let Some((delay, scripted)) = self.windows.get(&start) else {
            tokio::time::sleep(Duration::from_millis(10)).await;
            return Ok(UpstreamResult::Success {
                groups_by_date: BTreeMap::from([(start.to_string(), Vec::new())]),
            });
        };

        tokio::time::sleep(*delay).await;

        match scripted {
            Scripted::Found(found) => Ok(UpstreamResult::Success {
                groups_by_date: BTreeMap::from([(start.to_string(), found.clone())]),
            }),
            Scripted::Grouped(groups) => Ok(UpstreamResult::Success {
                groups_by_date: groups.clone(),
            }),
            Scripted::Empty => Ok(UpstreamResult::Success {
                groups_by_date: BTreeMap::new(),
            }),
            Scripted::Failed(failure) => Ok(UpstreamResult::Failure(failure.clone())),
            Scripted::TransportError => Err(UpstreamError::Timeout(1)),
            Scripted::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    async fn details_of(&self, id: AsteroidId) -> Result<DetailsResponse, UpstreamError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        match id {
            id if id < 0 => Err(UpstreamError::Timeout(1)),
            0 => Ok(DetailsResponse {
                status: StatusCode::NOT_FOUND,
                body: serde_json::json!({"code": 404, "http_error": "NOT_FOUND"}),
            }),
            id => Ok(DetailsResponse {
                status: StatusCode::OK,
                body: serde_json::json!({"id": id.to_string(), "name": format!("Asteroid {id}")}),
            }),
        }
    }
}
