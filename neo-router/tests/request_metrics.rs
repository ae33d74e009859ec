//! Request metrics recorded by the API middleware.
//!
//! Installs a global recorder, so it lives in its own test binary.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use favourites::store::MemoryStore;
use favourites::{AsteroidId, FavouritesGateway};
use metrics::{
    Counter, Gauge, GaugeFn, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder,
    SharedString, Unit,
};
use neo_router::api::{AppState, router};
use neo_router::config::DetailsCacheConfig;
use neo_router::details::DetailsService;
use neo_router::lookup::AsteroidLookupService;
use neo_router::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT};
use neo_router::upstream::{DetailsResponse, UpstreamClient, UpstreamError, UpstreamResult};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

#[derive(Default)]
struct Captured {
    inflight: Mutex<f64>,
    statuses: Mutex<Vec<String>>,
}

impl Captured {
    fn inflight(&self) -> f64 {
        *self.inflight.lock().unwrap()
    }

    fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }
}

struct InflightGauge(Arc<Captured>);

impl GaugeFn for InflightGauge {
    fn increment(&self, value: f64) {
        *self.0.inflight.lock().unwrap() += value;
    }

    fn decrement(&self, value: f64) {
        *self.0.inflight.lock().unwrap() -= value;
    }

    fn set(&self, value: f64) {
        *self.0.inflight.lock().unwrap() = value;
    }
}

struct DurationHistogram {
    captured: Arc<Captured>,
    status: String,
}

impl HistogramFn for DurationHistogram {
    fn record(&self, _value: f64) {
        self.captured
            .statuses
            .lock()
            .unwrap()
            .push(self.status.clone());
    }
}

struct CapturingRecorder(Arc<Captured>);

impl Recorder for CapturingRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
        Counter::noop()
    }

    fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
        if key.name() != REQUESTS_INFLIGHT.name {
            return Gauge::noop();
        }
        Gauge::from_arc(Arc::new(InflightGauge(self.0.clone())))
    }

    fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
        if key.name() != REQUEST_DURATION.name {
            return Histogram::noop();
        }
        let status = key
            .labels()
            .find(|label| label.key() == "status")
            .map(|label| label.value().to_string())
            .unwrap_or_default();
        Histogram::from_arc(Arc::new(DurationHistogram {
            captured: self.0.clone(),
            status,
        }))
    }
}

/// Never answers.
struct HangingUpstream;

#[async_trait]
impl UpstreamClient for HangingUpstream {
    async fn search_by_range(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<UpstreamResult, UpstreamError> {
        std::future::pending().await
    }

    async fn details_of(&self, _id: AsteroidId) -> Result<DetailsResponse, UpstreamError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_inflight_gauge_survives_dropped_requests() {
    let captured = Arc::new(Captured::default());
    metrics::set_global_recorder(CapturingRecorder(captured.clone())).unwrap();

    let upstream = Arc::new(HangingUpstream);
    let app = router(AppState {
        lookup: Arc::new(AsteroidLookupService::new(upstream.clone(), 4)),
        details: Arc::new(DetailsService::new(upstream, &DetailsCacheConfig::default())),
        favourites: FavouritesGateway::new(Arc::new(MemoryStore::new())),
        request_timeout: Duration::from_secs(60),
    });

    // The client goes away while the search is waiting on the upstream
    let request = Request::get("/passthrough/search_by_range?start_date=2024-01-01&end_date=2024-01-03")
        .body(Body::empty())
        .unwrap();
    let pending = tokio::spawn(app.clone().oneshot(request));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(captured.inflight(), 1.0);

    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());
    assert_eq!(captured.inflight(), 0.0);
    assert_eq!(captured.statuses(), vec!["cancelled"]);

    // A completed request is recorded with its status
    let request = Request::get("/passthrough/favourites")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(captured.inflight(), 0.0);
    assert_eq!(captured.statuses(), vec!["cancelled", "200"]);
}
