//! Fan-out of a date window search across upstream-sized windows.
//!
//! ```text
//!  start..end
//!      │ chunk
//!      ▼
//!  [w0, w1, w2]  ── one task per window, spawned as slots free up, at most N in flight ──▶ upstream
//!      │
//!      │ results re-sequenced to window order
//!      ▼
//!  aggregate: concatenate, stable sort by name
//! ```
//!
//! A window the upstream answers with an error or without data contributes
//! nothing and is logged. A transport failure fails the whole lookup, aborts
//! the calls in flight and issues no further ones.

use crate::aggregator::aggregate;
use crate::chunker::{self, DateRange, InvalidRangeError};
use crate::metrics_defs::{UPSTREAM_PARTIAL_FAILURES, UPSTREAM_REQUEST_DURATION};
use crate::types::AsteroidRecord;
use crate::upstream::{UpstreamClient, UpstreamError, UpstreamResult};
use chrono::NaiveDate;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("lookup task failed: {0}")]
    Internal(String),
}

pub struct AsteroidLookupService {
    upstream: Arc<dyn UpstreamClient>,
    max_concurrent_requests: usize,
}

impl AsteroidLookupService {
    pub fn new(upstream: Arc<dyn UpstreamClient>, max_concurrent_requests: usize) -> Self {
        Self {
            upstream,
            // No window could ever be spawned with zero slots
            max_concurrent_requests: max_concurrent_requests.max(1),
        }
    }

    /// Returns every asteroid with a close approach in `[start, end]`,
    /// sorted by name.
    pub async fn lookup(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AsteroidRecord>, LookupError> {
        let per_range = self.lookup_per_range(start, end).await?;
        Ok(aggregate(per_range))
    }

    /// Returns the records of each window, in window order.
    ///
    /// Dropping the returned future aborts all in-flight upstream calls.
    pub async fn lookup_per_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Vec<AsteroidRecord>>, LookupError> {
        let ranges = chunker::chunk(start, end)?;
        tracing::debug!(
            start = %start,
            end = %end,
            windows = ranges.len(),
            "Split search into windows"
        );

        let mut pending = ranges.iter().copied().enumerate();
        let mut join_set = JoinSet::new();
        let mut per_range: Vec<Vec<AsteroidRecord>> = vec![Vec::new(); ranges.len()];

        // Any early return drops the join set, which aborts the remaining tasks
        loop {
            while join_set.len() < self.max_concurrent_requests {
                let Some((index, range)) = pending.next() else {
                    break;
                };
                let upstream = self.upstream.clone();
                join_set.spawn(async move { (index, search_window(upstream, range).await) });
            }

            let Some(join_result) = join_set.join_next().await else {
                break;
            };

            let (index, result) = join_result.map_err(|e| {
                tracing::error!("Task panicked: {}", e);
                LookupError::Internal(e.to_string())
            })?;

            let range = ranges[index];
            let upstream_result = result.inspect_err(|e| {
                tracing::error!(
                    window = %range,
                    error = %e,
                    "Upstream unreachable, failing search"
                );
            })?;

            per_range[index] = flatten(range, upstream_result);
        }

        Ok(per_range)
    }
}

/// Calls the upstream for one window.
async fn search_window(
    upstream: Arc<dyn UpstreamClient>,
    range: DateRange,
) -> Result<UpstreamResult, UpstreamError> {
    tracing::info!(window = %range, "Searching window");

    let started = Instant::now();
    let result = upstream.search_by_range(range.start, range.end).await;
    histogram!(UPSTREAM_REQUEST_DURATION).record(started.elapsed().as_secs_f64());

    result
}

/// Projects one window's upstream answer to records.
fn flatten(range: DateRange, result: UpstreamResult) -> Vec<AsteroidRecord> {
    match result {
        UpstreamResult::Success { groups_by_date } if !groups_by_date.is_empty() => {
            let records: Vec<AsteroidRecord> = groups_by_date
                .into_values()
                .flatten()
                .map(AsteroidRecord::from)
                .collect();
            tracing::debug!(window = %range, count = records.len(), "Window returned records");
            records
        }
        UpstreamResult::Success { .. } => {
            counter!(UPSTREAM_PARTIAL_FAILURES).increment(1);
            tracing::error!(window = %range, "Upstream returned no data for window");
            Vec::new()
        }
        UpstreamResult::Failure(failure) => {
            counter!(UPSTREAM_PARTIAL_FAILURES).increment(1);
            tracing::error!(
                window = %range,
                code = failure.code,
                http_error = %failure.http_error,
                message = %failure.message,
                request = %failure.request,
                "Upstream returned an error for window"
            );
            Vec::new()
        }
    }
}
