//! Metrics definitions for neo-router.

use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Inbound request duration in seconds. Tagged with route, status.",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of inbound requests currently being processed",
};

pub const UPSTREAM_REQUEST_DURATION: MetricDef = MetricDef {
    name: "upstream.request.duration",
    metric_type: MetricType::Histogram,
    description: "Duration of a single upstream feed call in seconds",
};

pub const UPSTREAM_PARTIAL_FAILURES: MetricDef = MetricDef {
    name: "upstream.partial_failures",
    metric_type: MetricType::Counter,
    description: "Date windows dropped from a search because the upstream returned no data",
};

pub const DETAILS_CACHE_HIT: MetricDef = MetricDef {
    name: "details_cache.hit",
    metric_type: MetricType::Counter,
    description: "Detail lookups served from the cache",
};

pub const DETAILS_CACHE_MISS: MetricDef = MetricDef {
    name: "details_cache.miss",
    metric_type: MetricType::Counter,
    description: "Detail lookups forwarded to the upstream",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    REQUESTS_INFLIGHT,
    UPSTREAM_REQUEST_DURATION,
    UPSTREAM_PARTIAL_FAILURES,
    DETAILS_CACHE_HIT,
    DETAILS_CACHE_MISS,
];
